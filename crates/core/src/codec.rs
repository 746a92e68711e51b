// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Section (de)serialization: one interpreter over the tagged field lists.

use crate::json::{JsonReader, JsonWriter};
use crate::layout::{
    fields_differ, read_field, write_field, FieldDef, FieldType, FieldValue, SectionLayout,
};
use tracing::trace;

fn add_json_field(writer: &mut JsonWriter, def: &FieldDef, bytes: &[u8]) {
    match read_field(bytes, def) {
        FieldValue::Bool(v) => writer.add_bool(&def.name, v),
        FieldValue::Int(v) => writer.add_int(&def.name, v),
        FieldValue::Uint(v) => writer.add_uint(&def.name, v),
        FieldValue::Float(v) => writer.add_float(&def.name, v),
        FieldValue::Str(v) => writer.add_string(&def.name, &v),
    }
}

/// Serialize every field of a section.
pub fn serialize_section(layout: &SectionLayout, bytes: &[u8], writer: &mut JsonWriter) {
    for def in &layout.fields {
        add_json_field(writer, def, bytes);
    }
}

/// Serialize only the fields that differ from `baseline`. The writer stays
/// empty when nothing changed; receivers preserve unmentioned fields.
pub fn serialize_delta(
    layout: &SectionLayout,
    bytes: &[u8],
    baseline: &[u8],
    float_tol: f32,
    writer: &mut JsonWriter,
) {
    for def in &layout.fields {
        if fields_differ(bytes, baseline, def, float_tol) {
            add_json_field(writer, def, bytes);
        }
    }
}

/// Apply an incoming object to a section buffer.
///
/// Fields present in the object overwrite the buffer; absent, mistyped, or
/// out-of-range fields leave the current value intact. Unknown keys in the
/// object are ignored entirely.
pub fn deserialize_section(layout: &SectionLayout, reader: &JsonReader, bytes: &mut [u8]) {
    for def in &layout.fields {
        let value = match def.ty {
            FieldType::Bool => reader.get_bool(&def.name).map(FieldValue::Bool),
            FieldType::I8 | FieldType::I16 | FieldType::I32 => {
                reader.get_int(&def.name).map(FieldValue::Int)
            }
            FieldType::U8 | FieldType::U16 | FieldType::U32 => {
                reader.get_uint(&def.name).map(FieldValue::Uint)
            }
            FieldType::F32 => reader.get_float(&def.name).map(FieldValue::Float),
            FieldType::Str(_) => reader
                .get_string(&def.name)
                .map(|s| FieldValue::Str(s.to_string())),
        };
        let Some(value) = value else { continue };
        if write_field(bytes, def, &value).is_err() {
            trace!(field = %def.name, "incoming value out of range, keeping current");
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
