use super::*;
use crate::codes::Opcode;
use crate::encode::Encoder;
use crate::field::{FieldNode, FieldTree};
use crate::message::{Constraint, Device, OptionDescriptor, Parameters, RangeConstraint, Reply, Request};

fn ids(nodes: &[FieldNode<'_>]) -> Vec<FieldId> {
    nodes.iter().map(|n| n.id).collect()
}

fn contains(nodes: &[FieldNode<'_>], id: FieldId) -> bool {
    nodes.iter().any(|n| n.id == id || contains(&n.children, id))
}

fn option<'a>(name: &'a str, constraint: Constraint<'a>) -> OptionDescriptor<'a> {
    OptionDescriptor {
        name: Text(name.as_bytes()),
        title: Text(b"Title"),
        desc: Text(b"Description"),
        value_type: 1,
        unit: 3,
        size: 4,
        cap: 5,
        constraint,
    }
}

#[test]
fn init_request() {
    let bytes = Encoder::new().u32(0).u32(0x0102_0003).string(b"abcd").into_vec();
    let mut tree = FieldTree::new();
    let decoded = decode_request(&bytes, 0, &mut tree).unwrap();

    assert_eq!(decoded.end, 16);
    let Request::Init { version, user_name } = decoded.value else {
        panic!("expected INIT, got {:?}", decoded.value);
    };
    assert_eq!(version, VersionCode { major: 1, minor: 2, build: 3 });
    assert_eq!(user_name, "abcd");

    let roots = tree.finish();
    assert_eq!(ids(&roots), [FieldId::RpcCode, FieldId::VersionCode, FieldId::UserName]);
    let version = &roots[1];
    assert_eq!(version.range, 4..8);
    assert_eq!(ids(&version.children), [FieldId::VersionMajor, FieldId::VersionMinor, FieldId::VersionBuild]);
    assert_eq!(version.children[2].range, 6..8);
    assert_eq!(roots[2].range, 12..16);
}

#[test]
fn get_devices_reply_single_device() {
    let bytes = Encoder::new()
        .u32(0)
        .u32(1)
        .u32(0)
        .string(b"d1")
        .string(b"v1")
        .string(b"m1")
        .string(b"t1")
        .into_vec();
    let mut tree = FieldTree::new();
    let decoded = decode_reply(Opcode::GetDevices as u32, &bytes, 0, &mut tree).unwrap();

    assert_eq!(decoded.end, bytes.len());
    let expected = Device { name: Text(b"d1"), vendor: Text(b"v1"), model: Text(b"m1"), kind: Text(b"t1") };
    assert_eq!(decoded.value, Reply::GetDevices { status: 0, devices: vec![Some(expected)] });

    let roots = tree.finish();
    assert_eq!(ids(&roots), [FieldId::RpcStatus, FieldId::Device], "count word is not a field");
    let device = &roots[1];
    assert_eq!(device.range, 12..bytes.len());
    assert_eq!(
        ids(&device.children),
        [FieldId::DeviceName, FieldId::DeviceVendor, FieldId::DeviceModel, FieldId::DeviceType]
    );
}

#[test]
fn nonzero_device_placeholder_is_absent() {
    let bytes = Encoder::new()
        .u32(0)
        .u32(2)
        .u32(1)
        .u32(0)
        .string(b"a")
        .string(b"b")
        .string(b"c")
        .string(b"d")
        .into_vec();
    let decoded = decode_reply(Opcode::GetDevices as u32, &bytes, 0, &mut ()).unwrap();
    let Reply::GetDevices { devices, .. } = decoded.value else {
        panic!("expected GET_DEVICES");
    };
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0], None);
    assert_eq!(devices[1].as_ref().map(|d| d.name), Some(Text(b"a")));
    assert_eq!(decoded.end, 4 + 4 + 4 + 4 + 4 * 5);
}

#[test]
fn option_descriptors_with_every_constraint_kind() {
    let reply = Reply::GetOptionDescriptors {
        options: vec![
            Some(option("none", Constraint::None)),
            None,
            Some(option("range", Constraint::Range(Some(RangeConstraint { min: 0, max: 100, quant: 1 })))),
            Some(option("null-range", Constraint::Range(None))),
            Some(option("words", Constraint::WordList(vec![75, 150, 300]))),
            Some(option("strings", Constraint::StringList(vec![Text(b"Color"), Text(b"Gray")]))),
            Some(option("other", Constraint::Other(9))),
            Some(option("after", Constraint::None)),
        ],
    };
    let bytes = Encoder::new().reply(&reply).into_vec();
    let mut tree = FieldTree::new();
    let decoded = decode_reply(Opcode::GetOptionDescriptors as u32, &bytes, 0, &mut tree).unwrap();

    assert_eq!(decoded.value, reply);
    assert_eq!(decoded.end, bytes.len());

    let roots = tree.finish();
    assert_eq!(roots[0].id, FieldId::NumOptions);
    assert_eq!(roots[0].value, FieldValue::U32(8));
    assert_eq!(roots.len(), 1 + 7, "absent option emits nothing");

    let range = roots[2].child(FieldId::ConstraintRange).unwrap();
    assert_eq!(ids(&range.children), [FieldId::RangeMin, FieldId::RangeMax, FieldId::RangeQuant]);
    assert!(roots[3].child(FieldId::ConstraintRange).is_none());

    let words = roots[4].child(FieldId::WordList).unwrap();
    assert_eq!(words.value, FieldValue::U32(3));
    assert_eq!(words.children.len(), 3);

    let strings = roots[5].child(FieldId::StringList).unwrap();
    assert_eq!(strings.children[1].value, FieldValue::Str(b"Gray"));
}

#[test]
fn truncated_option_descriptor_restarts_at_message_start() {
    let desc = b"Selects the scan mode and depth";
    let mut long = option("n", Constraint::None);
    long.desc = Text(desc);
    let bytes = Encoder::new().reply(&Reply::GetOptionDescriptors { options: vec![Some(long)] }).into_vec();
    // One byte short of the end of the description text.
    let cut = 4 + 4 + (4 + 1) + (4 + 5) + 4 + desc.len() - 1;

    let mut tree = FieldTree::new();
    let err = decode_reply(Opcode::GetOptionDescriptors as u32, &bytes[..cut], 0, &mut tree).unwrap_err();
    assert_eq!(err, NeedMore { resume_from: 0, additional: 1 });

    let roots = tree.finish();
    assert!(contains(&roots, FieldId::OptionTitle));
    assert!(!contains(&roots, FieldId::OptionDesc), "no field for the string that did not fit");
}

#[test]
fn truncated_string_reports_exact_shortfall() {
    let bytes = Encoder::new().u32(Opcode::Open as u32).string(b"net:scanner").into_vec();
    let err = decode_request(&bytes[..bytes.len() - 1], 0, &mut ()).unwrap_err();
    assert_eq!(err, NeedMore { resume_from: 0, additional: 1 });
}

#[test]
fn need_more_is_addressed_at_caller_offset() {
    let mut bytes = vec![0xff; 5];
    bytes.extend(Encoder::new().u32(Opcode::Authorize as u32).string(b"res").string(b"user").into_vec());
    let err = decode_request(&bytes, 5, &mut ()).unwrap_err();
    assert_eq!(err.resume_from, 5);
    assert_eq!(err.additional, 4, "password length word is missing");
}

#[test]
fn lookahead_checks_whole_fixed_run() {
    let bytes = Encoder::new().u32(Opcode::ControlOption as u32).u32(1).into_vec();
    let mut tree = FieldTree::new();
    let err = decode_request(&bytes, 0, &mut tree).unwrap_err();
    assert_eq!(err, NeedMore { resume_from: 0, additional: 20 });
    assert_eq!(ids(&tree.finish()), [FieldId::RpcCode], "handle is not read before the check");

    let status_only = Encoder::new().u32(0).into_vec();
    let err = decode_reply(Opcode::Init as u32, &status_only, 0, &mut ()).unwrap_err();
    assert_eq!(err.additional, 4);
}

#[test]
fn control_option_element_count_is_consumed_silently() {
    let request = Request::ControlOption {
        handle: 1,
        option: 2,
        action: 1,
        value_type: 1,
        element_count: 1,
        value: &[0, 0, 1, 44],
    };
    let bytes = Encoder::new().request(&request).into_vec();
    let mut tree = FieldTree::new();
    let decoded = decode_request(&bytes, 0, &mut tree).unwrap();
    assert_eq!(decoded.value, request);
    assert_eq!(decoded.end, 32);

    let roots = tree.finish();
    assert_eq!(
        ids(&roots),
        [
            FieldId::RpcCode,
            FieldId::Handle,
            FieldId::OptionNum,
            FieldId::Action,
            FieldId::ValueType,
            FieldId::ValueSize,
            FieldId::Value
        ]
    );
    assert_eq!(roots[6].range, 28..32);
}

#[test]
fn control_option_reply() {
    let reply = Reply::ControlOption {
        status: 0,
        info: 4,
        value_type: 3,
        element_count: 1,
        value: b"Color\0",
        resource: Text(b""),
    };
    let bytes = Encoder::new().reply(&reply).into_vec();
    let decoded = decode_reply(Opcode::ControlOption as u32, &bytes, 0, &mut ()).unwrap();
    assert_eq!(decoded.value, reply);
    assert_eq!(decoded.end, 20 + 6 + 4);
}

#[test]
fn parameters_group() {
    let parameters =
        Parameters { format: 1, last_frame: true, bytes_per_line: 300, pixels_per_line: 100, lines: 50, depth: 8 };
    let bytes = Encoder::new().reply(&Reply::GetParameters { status: 0, parameters }).into_vec();
    let mut tree = FieldTree::new();
    let decoded = decode_reply(Opcode::GetParameters as u32, &bytes, 0, &mut tree).unwrap();
    assert_eq!(decoded.value, Reply::GetParameters { status: 0, parameters });

    let roots = tree.finish();
    let group = &roots[1];
    assert_eq!(group.id, FieldId::Parameters);
    assert_eq!(group.range, 4..28);
    assert_eq!(group.child(FieldId::ParamLastFrame).map(|n| n.value), Some(FieldValue::Bool(true)));

    let err = decode_reply(Opcode::GetParameters as u32, &bytes[..27], 0, &mut ()).unwrap_err();
    assert_eq!(err.additional, 1);
}

#[test]
fn start_and_open_replies() {
    let start = Reply::Start { status: 0, port: 40001, byte_order: 0x1234, resource: Text(b"") };
    let bytes = Encoder::new().reply(&start).into_vec();
    assert_eq!(decode_reply(Opcode::Start as u32, &bytes, 0, &mut ()).unwrap().value, start);

    let open = Reply::Open { status: 0, handle: 7, resource: Text(b"auth") };
    let bytes = Encoder::new().reply(&open).into_vec();
    assert_eq!(decode_reply(Opcode::Open as u32, &bytes, 0, &mut ()).unwrap().value, open);
}

#[test]
fn dummy_and_empty_replies() {
    let bytes = [0, 0, 0, 0];
    for opcode in [Opcode::Close, Opcode::Cancel, Opcode::Authorize] {
        let decoded = decode_reply(opcode as u32, &bytes, 0, &mut ()).unwrap();
        assert_eq!(decoded.value, Reply::Dummy { opcode: opcode as u32, value: 0 });
        assert_eq!(decoded.end, 4);
    }

    let decoded = decode_reply(Opcode::Exit as u32, &bytes, 0, &mut ()).unwrap();
    assert_eq!(decoded.value, Reply::Empty { opcode: Opcode::Exit as u32 });
    assert_eq!(decoded.end, 0);

    let decoded = decode_reply(77, &[], 0, &mut ()).unwrap();
    assert_eq!(decoded.value, Reply::Empty { opcode: 77 });
}

#[test]
fn bodyless_requests() {
    for (opcode, expected) in [(Opcode::GetDevices, Request::GetDevices), (Opcode::Exit, Request::Exit)] {
        let bytes = Encoder::new().u32(opcode as u32).into_vec();
        let decoded = decode_request(&bytes, 0, &mut ()).unwrap();
        assert_eq!(decoded.value, expected);
        assert_eq!(decoded.end, 4);
    }
    assert_eq!(decode_request(&[0, 0], 0, &mut ()).unwrap_err().additional, 2);
}

#[test]
fn every_request_decodes_back_to_itself() {
    let version = VersionCode { major: 1, minor: 0, build: 3 };
    let requests = [
        Request::Init { version, user_name: Text(b"user") },
        Request::GetDevices,
        Request::Open { device_name: Text(b"net:host:pixma") },
        Request::Close { handle: 1 },
        Request::GetOptionDescriptors { handle: 2 },
        Request::ControlOption {
            handle: 3,
            option: 4,
            action: 1,
            value_type: 1,
            element_count: 1,
            value: &[0, 0, 1, 44],
        },
        Request::GetParameters { handle: 5 },
        Request::Start { handle: 6 },
        Request::Cancel { handle: 7 },
        Request::Authorize { resource: Text(b"pixma"), username: Text(b"alice"), password: Text(b"$MD5$abc") },
        Request::Exit,
    ];

    for request in requests {
        let bytes = Encoder::new().request(&request).into_vec();
        let decoded = decode_request(&bytes, 0, &mut ()).unwrap();
        assert_eq!(decoded.value, request);
        assert_eq!(decoded.end, bytes.len(), "{request:?}");
        assert_eq!(decoded.value.opcode(), u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
    }
}
