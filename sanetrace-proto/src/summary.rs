use crate::codes::opcode_name;
use crate::direction::{Direction, Ports};

/// One-line description of a message: ports, direction and, for requests
/// with a complete opcode word, the opcode name.
///
/// Never fails; missing data leaves the opcode name blank.
///
/// # Examples
///
/// ```
/// use sanetrace_proto::direction::{Direction, Ports};
/// use sanetrace_proto::summary::summarize;
///
/// let ports = Ports { src: 40000, dst: 6566 };
/// assert_eq!(summarize(ports, Direction::Request, &[0, 0, 0, 2]), "40000 > 6566 - Request SANE_NET_OPEN");
/// assert_eq!(summarize(ports, Direction::Request, &[0, 0]), "40000 > 6566 - Request ");
/// ```
pub fn summarize(ports: Ports, direction: Direction, bytes: &[u8]) -> String {
    let name = match (direction, bytes) {
        (Direction::Request, [a, b, c, d, ..]) => opcode_name(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => String::new(),
    };
    format!("{} > {} - {} {}", ports.src, ports.dst, direction.as_str(), name)
}
