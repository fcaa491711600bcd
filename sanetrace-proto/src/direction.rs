/// Well-known TCP port of the scanner daemon.
pub const SANE_PORT: u16 = 6566;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "Request",
            Direction::Response => "Response",
        }
    }
}

/// Source and destination ports of one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ports {
    pub src: u16,
    pub dst: u16,
}

/// A message is a request when it is addressed to the service port, or to
/// the port already established as this connection's server side.
pub fn classify(ports: Ports, server_port: Option<u16>, service_port: u16) -> Direction {
    if ports.dst == service_port || server_port == Some(ports.dst) {
        Direction::Request
    } else {
        Direction::Response
    }
}
