mod parse;
mod query_type;

pub use parse::query_type_of;
pub use query_type::query_type_name;

use hickory_proto::op::Message;

/// Summary of the first question of a DNS message for query logging
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct QuestionSummary {
  pub id: u16,
  pub qname: String,
  pub qtype: String,
}

/// Decode a DNS message just enough to summarize it in the query log.
/// Unlike `query_type_of`, the message is fully validated, so a malformed one yields `None`.
pub(crate) fn summarize(packet_buf: &[u8]) -> Option<QuestionSummary> {
  let message = Message::from_vec(packet_buf).ok()?;
  let (qname, qtype) = message
    .query()
    .map(|q| (q.name().to_string(), q.query_type().to_string()))
    .unwrap_or_default();
  Some(QuestionSummary {
    id: message.id(),
    qname,
    qtype,
  })
}
