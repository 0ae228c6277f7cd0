#![no_main]

use cb_codec::CbWriter;
use cb_format::CbFieldType;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

#[derive(Arbitrary, Debug)]
enum Op {
    Name(String),
    Null,
    Int(i64),
    Str(String),
    Binary(Vec<u8>),
    BeginObject,
    BeginArray,
    BeginUniformInts,
    EndObject,
    EndArray,
}

fuzz_target!(|ops: Vec<Op>| {
    let mut writer = CbWriter::new();
    for op in &ops {
        let _ = match op {
            Op::Name(name) => {
                writer.name(name);
                Ok(())
            }
            Op::Null => writer.write_null(),
            Op::Int(v) => writer.write_i64(*v),
            Op::Str(s) => writer.write_str(s),
            Op::Binary(b) => writer.write_binary(b),
            Op::BeginObject => writer.begin_object(),
            Op::BeginArray => writer.begin_array(),
            Op::BeginUniformInts => writer.begin_uniform_array(CbFieldType::IntegerPositive),
            Op::EndObject => writer.end_object(),
            Op::EndArray => writer.end_array(),
        };
    }
    // Any output the writer accepts must parse back.
    if writer.is_complete() && writer.field_count() == 1 {
        let field = writer.save_field().expect("complete output parses");
        assert_eq!(writer.hash().unwrap(), field.hash());
    }
});
