mod counter;
mod proxy_main;
mod proxy_udp;
mod socket;

pub use proxy_main::Proxy;
