use storable_testkit::StreamBuilder;

use crate::codec::{DecodeOptions, ErrorKind, HookKind, Key, RawBytes, StorableError, TypeGuess, Value, decode, decode_with};

#[test]
fn decodes_two_scalar_array() {
	let bytes = b"\x05\x09\x02\x00\x00\x00\x02\x0a\x01a\x0a\x01b";
	let value = decode(bytes).expect("decodes");
	assert_eq!(value, Value::array(vec!["a".into(), "b".into()]));
}

#[test]
fn decodes_numeric_records() {
	let bytes = StreamBuilder::network()
		.array(6)
		.small_int(-5)
		.net_int(-70_000)
		.integer(1 << 40)
		.double(2.5)
		.byte(0x0f)
		.byte(0x10)
		.finish();
	let value = decode(&bytes).expect("decodes");
	assert_eq!(
		value,
		Value::array(vec![
			Value::Int(-5),
			Value::Int(-70_000),
			Value::Int(1 << 40),
			Value::Float(2.5),
			Value::Bool(true),
			Value::Bool(false),
		])
	);
}

#[test]
fn undef_records_decode_to_null() {
	let bytes = StreamBuilder::network().array(2).undef().byte(0x0e).finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::array(vec![Value::Null, Value::Null]));
}

#[test]
fn hash_reads_value_before_key() {
	let bytes = StreamBuilder::network().hash(1).small_int(1).key(b"x").finish();
	let value = decode(&bytes).expect("decodes");
	assert_eq!(value.get("x"), Some(Value::Int(1)));

	let swapped = StreamBuilder::network().hash(1).key(b"x").small_int(1).finish();
	match decode(&swapped) {
		Ok(other) => assert_ne!(other, value),
		Err(err) => assert_eq!(err.kind(), ErrorKind::Decode),
	}
}

#[test]
fn keys_stay_raw_unless_guessing_is_enabled() {
	let bytes = StreamBuilder::network().hash(1).undef().key(b"42").finish();

	let raw = decode(&bytes).expect("decodes");
	let map = raw.as_hash().expect("hash").borrow().clone();
	assert!(map.contains_key(&Key::Bytes(b"42".to_vec())));

	let opt = DecodeOptions {
		guess_keys: true,
		..DecodeOptions::default()
	};
	let guessed = decode_with(&bytes, &opt, &TypeGuess).expect("decodes");
	let map = guessed.as_hash().expect("hash").borrow().clone();
	assert!(map.contains_key(&Key::Int(42)));
}

#[test]
fn back_reference_shares_the_container() {
	let bytes = StreamBuilder::network().array(2).hash(0).backref(1).finish();
	let value = decode(&bytes).expect("decodes");

	let first = value.at(0).expect("first");
	let second = value.at(1).expect("second");
	assert!(first.same_as(&second), "both slots hold one allocation");
}

#[test]
fn self_reference_decodes_to_cycle() {
	let bytes = StreamBuilder::network_file().hash(1).reference().backref(0).key(b"self").finish();
	let value = decode(&bytes).expect("decodes");

	let inner = value.get("self").expect("self entry");
	assert!(inner.same_as(&value));
	assert_eq!(format!("{value:?}"), "{b\"self\": {...}}");
	value.release();
}

#[test]
fn back_reference_to_scalar_resolves_to_value() {
	let bytes = StreamBuilder::network().array(2).scalar(b"shared").backref(1).finish();
	let value = decode(&bytes).expect("decodes");
	assert_eq!(value, Value::array(vec!["shared".into(), "shared".into()]));
}

#[test]
fn back_reference_past_allocation_fails() {
	let bytes = StreamBuilder::network().array(1).backref(7).finish();
	let err = decode(&bytes).expect_err("index 7 never allocated");
	assert!(matches!(err, StorableError::BackrefOutOfRange { index: 7, allocated: 1 }));
}

#[test]
fn wrappers_do_not_consume_object_indices() {
	// Slots: 0 array, 1 tied hash contents (the wrapper takes none), 2 scalar.
	let bytes = StreamBuilder::network()
		.array(3)
		.byte(0x0c)
		.hash(0)
		.scalar(b"s")
		.backref(1)
		.finish();
	let value = decode(&bytes).expect("decodes");
	assert!(value.at(0).expect("hash").same_as(&value.at(2).expect("backref")));
}

#[test]
fn bless_records_are_transparent() {
	let bytes = StreamBuilder::network()
		.array(2)
		.bless("Foo::Bar")
		.hash(0)
		.ix_bless(0)
		.array(0)
		.finish();
	let value = decode(&bytes).expect("decodes");
	assert_eq!(value.at(0).expect("blessed hash").kind(), "hash");
	assert_eq!(value.at(1).expect("blessed array").kind(), "array");
}

#[test]
fn unknown_class_index_fails() {
	let bytes = StreamBuilder::network().ix_bless(3).undef().finish();
	let err = decode(&bytes).expect_err("no class registered");
	assert!(matches!(err, StorableError::ClassIndexOutOfRange { index: 3, len: 0 }));
}

#[test]
fn tied_elements_discard_their_locator() {
	let bytes = StreamBuilder::network()
		.array(2)
		.byte(0x15)
		.small_int(1)
		.scalar(b"key")
		.byte(0x16)
		.small_int(2)
		.net_u32(9)
		.finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::array(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn utf8_records_are_strict() {
	let bytes = StreamBuilder::network().utf8("caf\u{e9}").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::String("caf\u{e9}".into()));

	let bytes = StreamBuilder::network().byte(0x17).byte(1).byte(0xff).finish();
	let err = decode(&bytes).expect_err("invalid utf8");
	assert!(matches!(err, StorableError::InvalidUtf8 { at: 4 }));
}

#[test]
fn large_utf8_uses_size_width_length() {
	let text = "\u{3b1}".repeat(200);
	let bytes = StreamBuilder::network().byte(0x18).size(text.len() as u64).bytes(text.as_bytes()).finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::String(text));
}

#[test]
fn vstrings_split_into_components() {
	let bytes = StreamBuilder::network().byte(0x1d).byte(7).bytes(b"v1.22.3").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::VString(vec![1, 22, 3]));

	let bytes = StreamBuilder::network().byte(0x1e).size(0).finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::VString(Vec::new()));

	let bytes = StreamBuilder::network().byte(0x1d).byte(1).bytes(b"v").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::VString(Vec::new()));

	let bytes = StreamBuilder::network().byte(0x1d).byte(4).bytes(b"v1.x").finish();
	assert!(matches!(decode(&bytes).expect_err("non-numeric"), StorableError::InvalidVString { .. }));
}

#[test]
fn hook_record_captures_payload_and_listed_objects() {
	// Slots: 0 array, 1 scalar "z", 2 hook.
	let bytes = StreamBuilder::network()
		.array(2)
		.scalar(b"z")
		.byte(0x13)
		.byte(0x80 | 0x02)
		.byte(3)
		.bytes(b"Foo")
		.byte(2)
		.bytes(b"ab")
		.byte(1)
		.net_u32(1)
		.finish();
	let value = decode(&bytes).expect("decodes");

	let Some(Value::Hook(frame)) = value.at(1) else {
		panic!("expected hook frame, got {value:?}");
	};
	assert_eq!(frame.kind, HookKind::Hash);
	assert_eq!(frame.args.get(&0), Some(&Value::String("ab".into())));
	assert_eq!(frame.args.get(&1), Some(&Value::String("z".into())));
}

#[test]
fn hook_record_reuses_classes_and_recurses_nested_items() {
	let bytes = StreamBuilder::network()
		.array(2)
		.bless("Foo")
		.undef()
		.byte(0x13)
		.byte(0x40)
		.small_int(0)
		.byte(0x20 | 0x80)
		.byte(0)
		.byte(0)
		.byte(1)
		.net_u32(42)
		.finish();
	let value = decode(&bytes).expect("decodes");

	let Some(Value::Hook(frame)) = value.at(1) else {
		panic!("expected hook frame");
	};
	assert_eq!(frame.kind, HookKind::Scalar);
	assert_eq!(frame.args.get(&0), None, "empty payload is not an argument");
	assert_eq!(frame.args.get(&1), Some(&Value::Null), "absent object index yields null");
}

#[test]
fn flag_hash_ignores_flags() {
	let bytes = StreamBuilder::network()
		.byte(0x19)
		.byte(0x00)
		.size(2)
		.small_int(1)
		.byte(0x00)
		.key(b"a")
		.small_int(2)
		.byte(0x01)
		.key(b"")
		.finish();
	let value = decode(&bytes).expect("decodes");
	assert_eq!(value.get("a"), Some(Value::Int(1)));
	assert_eq!(value.get(""), Some(Value::Int(2)));
}

#[test]
fn strict_mode_refuses_hooks_and_flag_hashes() {
	let hook = StreamBuilder::network().byte(0x13).byte(0).byte(0).byte(0).finish();
	let err = decode_with(&hook, &DecodeOptions::strict(), &TypeGuess).expect_err("hook refused");
	assert!(matches!(err, StorableError::UnsupportedFeature { feature: "hook" }));
	assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);

	let flag_hash = StreamBuilder::network().byte(0x19).byte(0).size(0).finish();
	let err = decode_with(&flag_hash, &DecodeOptions::strict(), &TypeGuess).expect_err("flag hash refused");
	assert!(matches!(err, StorableError::UnsupportedFeature { feature: "flag hash" }));
}

#[test]
fn scalar_policy_is_pluggable() {
	let bytes = StreamBuilder::network().scalar(b"12").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::Int(12));
	let raw = decode_with(&bytes, &DecodeOptions::default(), &RawBytes).expect("decodes");
	assert_eq!(raw, Value::Bytes(b"12".to_vec()));
}

#[test]
fn native_headers_decode_like_network_order() {
	let expected = Value::array(vec![Value::Int(-42), Value::Float(0.25), "x".into()]);
	for builder in [StreamBuilder::network(), StreamBuilder::native_le64(), StreamBuilder::native_be32()] {
		let bytes = builder.array(3).integer(-42).double(0.25).large_scalar(b"x").finish();
		assert_eq!(decode(&bytes).expect("decodes"), expected);
	}
}

#[test]
fn vstring_without_leading_v_keeps_later_components() {
	let bytes = StreamBuilder::network().byte(0x1d).byte(5).bytes(b"1.2.3").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::VString(vec![2, 3]));

	let bytes = StreamBuilder::network().byte(0x1e).size(6).bytes(b"v1..22").finish();
	assert_eq!(decode(&bytes).expect("decodes"), Value::VString(vec![1, 22]));
}

#[test]
fn depth_is_bounded() {
	let mut bytes = vec![0x05, 0x09];
	bytes.extend(std::iter::repeat_n(0x04, 10_000));
	bytes.push(0x05);
	let err = decode(&bytes).expect_err("too deep");
	assert!(matches!(err, StorableError::DepthExceeded { max_depth: 128 }));

	let opt = DecodeOptions {
		max_depth: 3,
		..DecodeOptions::default()
	};
	let shallow = StreamBuilder::network().reference().reference().undef().finish();
	assert_eq!(decode_with(&shallow, &opt, &TypeGuess).expect("fits"), Value::Null);
	let deep = StreamBuilder::network().reference().reference().reference().undef().finish();
	assert!(decode_with(&deep, &opt, &TypeGuess).is_err());
}

#[test]
fn truncated_stream_is_truncation_error() {
	let bytes = StreamBuilder::network().array(2).scalar(b"a").finish();
	assert_eq!(decode(&bytes).expect_err("second element missing").kind(), ErrorKind::Truncated);

	let bytes = StreamBuilder::network().byte(0x0a).byte(9).bytes(b"abc").finish();
	assert!(matches!(
		decode(&bytes).expect_err("short scalar"),
		StorableError::UnexpectedEof { need: 9, rem: 3, .. }
	));
}

#[test]
fn forged_count_does_not_preallocate() {
	let bytes = StreamBuilder::network().array(u64::from(u32::MAX)).finish();
	assert_eq!(decode(&bytes).expect_err("no elements").kind(), ErrorKind::Truncated);
}

#[test]
fn unknown_opcode_is_decode_error() {
	let bytes = StreamBuilder::network().array(1).byte(0x1a).finish();
	let err = decode(&bytes).expect_err("0x1a is not a record");
	assert!(matches!(err, StorableError::UnknownOpcode { opcode: 0x1a, at: 7 }));
	assert_eq!(err.kind(), ErrorKind::Decode);
}

fn nested_arrays(levels: u32) -> Vec<u8> {
	let mut builder = StreamBuilder::network();
	for _ in 0..levels {
		builder = builder.array(1);
	}
	builder.undef().finish()
}

fn nested_hashes(levels: u32) -> Vec<u8> {
	let mut builder = StreamBuilder::network();
	for _ in 0..levels {
		builder = builder.hash(1);
	}
	builder = builder.undef();
	for _ in 0..levels {
		builder = builder.key(b"k");
	}
	builder.finish()
}

#[test]
fn default_depth_fits_a_small_thread_stack() {
	let levels = DecodeOptions::DEFAULT_MAX_DEPTH - 1;
	let arrays = nested_arrays(levels);
	let hashes = nested_hashes(levels);
	let mut runaway = vec![0x05, 0x09];
	runaway.extend(std::iter::repeat_n(0x04, 100_000));
	runaway.push(0x05);

	let worker = std::thread::Builder::new()
		.stack_size(2 * 1024 * 1024)
		.spawn(move || {
			let kind = |bytes: &[u8]| decode(bytes).map(|value| value.kind());
			(kind(&arrays), kind(&hashes), kind(&runaway))
		})
		.expect("spawn decode thread");
	let (arrays, hashes, runaway) = worker.join().expect("decode thread finishes without overflow");

	assert_eq!(arrays.expect("nested arrays within the bound"), "array");
	assert_eq!(hashes.expect("nested hashes within the bound"), "hash");
	assert!(matches!(runaway, Err(StorableError::DepthExceeded { max_depth: 128 })));
}

#[test]
fn one_level_past_the_default_bound_fails() {
	let bytes = nested_arrays(DecodeOptions::DEFAULT_MAX_DEPTH);
	assert!(matches!(decode(&bytes).expect_err("too deep"), StorableError::DepthExceeded { .. }));
}
