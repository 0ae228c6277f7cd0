#![no_main]

use cb_format::{validate, CbField, CbFieldIter, Limits, ValidateMode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(field) = CbField::from_bytes(data.to_vec()) {
        assert!(field.encoded_len() <= data.len());
        let _ = field.hash();
        let _ = field.to_json();
        field.iterate_attachments(|attachment| {
            let _ = attachment.as_attachment();
        });
        for child in field.iter() {
            let _ = child.as_str();
            let _ = child.as_f64();
            let _ = child.as_object().len();
        }
    }
    let _ = validate(data.to_vec(), ValidateMode::ALL, &Limits::default());
    let _ = CbFieldIter::from_bytes(data.to_vec()).count();
});
