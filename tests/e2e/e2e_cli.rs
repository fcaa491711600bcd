use sanetrace_proto::message::{Device, Text, VersionCode};
use sanetrace_proto::{Encoder, Reply, Request};

use crate::harness::{CLIENT, SERVER, TestHarness, segment};

fn init_request() -> Vec<u8> {
    Encoder::new()
        .request(&Request::Init {
            version: VersionCode { major: 1, minor: 2, build: 3 },
            user_name: Text(b"abcd"),
        })
        .into_vec()
}

fn init_reply() -> Vec<u8> {
    Encoder::new()
        .reply(&Reply::Init { status: 0, version: VersionCode { major: 1, minor: 0, build: 3 } })
        .into_vec()
}

fn get_devices_reply() -> Vec<u8> {
    let device = Device { name: Text(b"d1"), vendor: Text(b"v"), model: Text(b"m"), kind: Text(b"t") };
    Encoder::new().reply(&Reply::GetDevices { status: 0, devices: vec![Some(device)] }).into_vec()
}

#[test]
fn decode_prints_field_tree() {
    let harness = TestHarness::new("decode_tree");
    harness.write_transcript("capture.toml", &[segment(0, CLIENT, &init_request())]);

    let result = harness.run(&["decode", "capture.toml"]);
    assert!(result.success(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("40000 > 6566 - Request SANE_NET_INIT"), "{}", result.stdout);
    assert!(result.stdout.contains("User Name: abcd"), "{}", result.stdout);
    assert!(result.stdout.contains("Major: 1"), "{}", result.stdout);
}

#[test]
fn pipelined_requests_pair_in_order() {
    let harness = TestHarness::new("pipelined");
    let mut requests = init_request();
    requests.extend(Encoder::new().request(&Request::GetDevices).into_vec());
    let mut replies = init_reply();
    replies.extend(get_devices_reply());
    harness.write_transcript("capture.toml", &[segment(0, CLIENT, &requests), segment(0, SERVER, &replies)]);

    let result = harness.run(&["summary", "capture.toml"]);
    assert!(result.success(), "stderr: {}", result.stderr);
    let lines: Vec<&str> = result.stdout.lines().collect();
    assert_eq!(lines.len(), 4, "{}", result.stdout);
    assert!(lines[0].ends_with("Request SANE_NET_INIT"), "{}", lines[0]);
    assert!(lines[1].ends_with("Request SANE_NET_GET_DEVICES"), "{}", lines[1]);
    assert!(!result.stdout.contains('['), "no anomalies expected: {}", result.stdout);

    let tree = harness.run(&["decode", "capture.toml"]);
    assert!(tree.stdout.contains("Device Name: d1"), "{}", tree.stdout);
}

#[test]
fn json_output_carries_field_abbreviations() {
    let harness = TestHarness::new("json");
    harness.write_transcript("capture.toml", &[segment(0, CLIENT, &init_request())]);

    let result = harness.run(&["decode", "--json", "capture.toml"]);
    assert!(result.success(), "stderr: {}", result.stderr);
    assert!(result.stdout.trim_start().starts_with('{'), "{}", result.stdout);
    assert!(result.stdout.contains("sane.rpc.code"), "{}", result.stdout);
    assert!(result.stdout.contains("sane.net.user_name"), "{}", result.stdout);
}

#[test]
fn check_counts_segments() {
    let harness = TestHarness::new("check");
    harness.write_transcript(
        "capture.toml",
        &[segment(0, CLIENT, &init_request()), segment(0, SERVER, &init_reply()), segment(1, CLIENT, &[0, 0, 0, 10])],
    );

    let result = harness.run(&["check", "capture.toml"]);
    assert!(result.success(), "stderr: {}", result.stderr);
    assert_eq!(result.stdout.trim(), "capture.toml: 3 segments, 2 streams, 28 bytes");
}

#[test]
fn bad_hex_payload_fails() {
    let harness = TestHarness::new("bad_hex");
    std::fs::write(
        harness.temp_dir.join("capture.toml"),
        "[[segment]]\nsrc = 40000\ndst = 6566\ndata = \"zz\"\n",
    )
    .unwrap();

    let result = harness.run(&["check", "capture.toml"]);
    assert!(!result.success());
    assert!(result.stderr.contains("invalid hex payload"), "{}", result.stderr);
}

#[test]
fn bad_config_fails() {
    let harness = TestHarness::new("bad_config");
    harness.write_config("colour = true\n");
    harness.write_transcript("capture.toml", &[]);

    let result = harness.run(&["check", "capture.toml"]);
    assert!(!result.success());
    assert!(result.stderr.contains("unknown key"), "{}", result.stderr);
}

#[test]
fn port_override_changes_direction() {
    let harness = TestHarness::new("port_override");
    let client = sanetrace_proto::Ports { src: 40000, dst: 7000 };
    harness.write_transcript("capture.toml", &[segment(0, client, &init_request())]);

    let default = harness.run(&["summary", "capture.toml"]);
    assert!(default.success(), "stderr: {}", default.stderr);
    assert!(default.stdout.contains("40000 > 7000 - Response"), "{}", default.stdout);

    let overridden = harness.run(&["summary", "--port", "7000", "capture.toml"]);
    assert!(overridden.success(), "stderr: {}", overridden.stderr);
    assert!(overridden.stdout.contains("40000 > 7000 - Request SANE_NET_INIT"), "{}", overridden.stdout);
}

#[test]
fn incomplete_message_is_flagged() {
    let harness = TestHarness::new("incomplete");
    let request = init_request();
    harness.write_transcript("capture.toml", &[segment(0, CLIENT, &request[..10])]);

    let result = harness.run(&["summary", "capture.toml"]);
    assert!(result.success(), "stderr: {}", result.stderr);
    assert!(result.stdout.contains("insufficient data"), "{}", result.stdout);
}
