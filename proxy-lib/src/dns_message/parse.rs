use crate::constants::DNS_HEADER_LEN;

/// Extract the query type of the first question in a raw DNS query.
///
/// The question name is not decoded: labels are skipped as opaque bytes up to the first zero byte after the
/// header, and the two bytes following it are read as a big-endian query type. The result is only a hint for
/// shaping the upstream request, so a datagram that is too short or has no name terminator yields `None`.
pub fn query_type_of(packet_buf: &[u8]) -> Option<u16> {
  let question = packet_buf.get(DNS_HEADER_LEN..)?;
  let terminator = question.iter().position(|b| *b == 0)?;
  let qtype = question.get(terminator + 1..terminator + 3)?;
  Some(u16::from_be_bytes([qtype[0], qtype[1]]))
}
