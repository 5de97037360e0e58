use storable::codec::{Value, decode, decode_file};

use crate::cmd::test_support::{run_storable, scratch_path};

fn write_input(name: &str, json: &str) -> String {
	let path = scratch_path(name);
	std::fs::write(&path, json).expect("write input");
	path.to_string_lossy().into_owned()
}

#[test]
fn freeze_writes_retrievable_file() {
	let input = write_input("freeze_in.json", r#"{"name": "widget", "sizes": [1, 300, -5], "ratio": 0.25}"#);
	let output = scratch_path("freeze_out.storable");
	let output_arg = output.to_string_lossy().into_owned();

	let run = run_storable(&["freeze", "--input", &input, "--output", &output_arg]);
	assert!(run.status.success(), "{}", String::from_utf8_lossy(&run.stderr));

	let value = decode_file(&output).expect("reads").expect("has container magic");
	assert_eq!(value.get("name"), Some(Value::from("widget")));
	assert_eq!(value.get("sizes"), Some(Value::array(vec![Value::Int(1), Value::Int(300), Value::Int(-5)])));
	assert_eq!(value.get("ratio"), Some(Value::Float(0.25)));
}

#[test]
fn freeze_without_magic_writes_frozen_form() {
	let input = write_input("freeze_plain_in.json", "[null, true]");
	let output = scratch_path("freeze_plain_out.storable");
	let output_arg = output.to_string_lossy().into_owned();

	let run = run_storable(&["freeze", "--input", &input, "--output", &output_arg, "--no-magic"]);
	assert!(run.status.success());

	let bytes = std::fs::read(&output).expect("output exists");
	assert!(bytes.starts_with(b"\x05\x09\x02"));
	assert_eq!(decode(&bytes).expect("decodes"), Value::array(vec![Value::Null, Value::Int(1)]));
}

#[test]
fn freeze_rejects_invalid_json() {
	let input = write_input("freeze_bad_in.json", "{not json");
	let output = scratch_path("freeze_bad_out.storable");
	let output_arg = output.to_string_lossy().into_owned();

	let run = run_storable(&["freeze", "--input", &input, "--output", &output_arg]);
	assert!(!run.status.success());
	assert!(String::from_utf8_lossy(&run.stderr).contains("input is not valid json"));
}
