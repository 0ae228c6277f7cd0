#![no_main]

use cb_format::varint::{encode_var_uint, measure_encoded_var_uint, read_var_uint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let measured = measure_encoded_var_uint(data);
    if let Ok((value, len)) = read_var_uint(data) {
        assert_eq!(measured.ok(), Some(len));
        assert_eq!(read_var_uint(&encode_var_uint(value)).ok().map(|(v, _)| v), Some(value));
    }
});
