//! Rendering of analysed messages as a field tree, one-line summaries or
//! JSON.

use std::fmt::Write;

use sanetrace_proto::{FieldNode, FieldTable};

#[derive(jsony::Jsony, Debug, Clone, PartialEq)]
#[jsony(ToJson)]
pub struct FieldReport {
    pub abbrev: String,
    /// `Label: value` as shown in the text tree.
    pub display: String,
    pub start: usize,
    pub end: usize,
    #[jsony(skip_if = Vec::is_empty)]
    pub children: Vec<FieldReport>,
}

#[derive(jsony::Jsony, Debug, Clone, PartialEq)]
#[jsony(ToJson)]
pub struct MessageReport {
    /// Position among reported messages, starting at 1.
    pub index: usize,
    pub stream: u64,
    /// Offset of the message within its direction of the stream.
    pub offset: u64,
    pub length: usize,
    pub direction: String,
    pub summary: String,
    #[jsony(skip_if = Option::is_none)]
    pub opcode: Option<String>,
    /// `complete`, `incomplete`, `unresolved` or `truncated`.
    pub state: String,
    #[jsony(skip_if = Option::is_none)]
    pub anomaly: Option<String>,
    pub fields: Vec<FieldReport>,
}

#[derive(jsony::Jsony, Debug)]
#[jsony(ToJson)]
pub struct CaptureReport {
    pub passes: u32,
    pub messages: Vec<MessageReport>,
}

pub fn field_reports(table: &FieldTable, nodes: &[FieldNode<'_>]) -> Vec<FieldReport> {
    nodes
        .iter()
        .map(|node| FieldReport {
            abbrev: table.info(node.id).abbrev.to_string(),
            display: table.describe(node.id, &node.value),
            start: node.range.start,
            end: node.range.end,
            children: field_reports(table, &node.children),
        })
        .collect()
}

fn write_fields(out: &mut String, fields: &[FieldReport], depth: usize) {
    for field in fields {
        let _ = writeln!(out, "{:width$}{}", "", field.display, width = depth * 4);
        write_fields(out, &field.children, depth + 1);
    }
}

pub fn write_summary(out: &mut String, message: &MessageReport) {
    let _ = write!(out, "{:>4} {}", message.index, message.summary);
    if let Some(anomaly) = &message.anomaly {
        let _ = write!(out, " [{anomaly}]");
    }
    out.push('\n');
}

pub fn write_tree(out: &mut String, message: &MessageReport) {
    let _ = writeln!(
        out,
        "#{} stream {} offset {} length {}: {}",
        message.index, message.stream, message.offset, message.length, message.summary
    );
    write_fields(out, &message.fields, 1);
    if let Some(anomaly) = &message.anomaly {
        let _ = writeln!(out, "    [{}: {anomaly}]", message.state);
    }
}

pub fn to_json(report: &CaptureReport) -> String {
    jsony::to_json(report)
}
