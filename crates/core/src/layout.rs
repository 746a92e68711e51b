// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Section layouts: the tagged field lists that drive the codec.
//!
//! Every table section (config, state, status) is described by a flat list
//! of `FieldDef` records over a packed byte buffer. A single interpreter in
//! [`crate::codec`] walks these lists for serialization, deserialization,
//! and delta comparison; there are no per-schema function pointers.

use crate::error::SdsError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Closed set of primitive field types a section may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    /// Fixed-capacity NUL-terminated string; the capacity includes the
    /// terminator byte.
    Str(usize),
}

impl FieldType {
    /// In-buffer size of a value of this type.
    pub fn size(self) -> usize {
        match self {
            FieldType::Bool | FieldType::I8 | FieldType::U8 => 1,
            FieldType::I16 | FieldType::U16 => 2,
            FieldType::I32 | FieldType::U32 | FieldType::F32 => 4,
            FieldType::Str(cap) => cap,
        }
    }
}

/// A concrete field value. Integers are widened so one variant covers all
/// signed and all unsigned buffer types; range checks happen on write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f32),
    Str(String),
}

impl FieldValue {
    /// The zero value for a field type.
    pub fn zero_for(ty: FieldType) -> Self {
        match ty {
            FieldType::Bool => FieldValue::Bool(false),
            FieldType::I8 | FieldType::I16 | FieldType::I32 => FieldValue::Int(0),
            FieldType::U8 | FieldType::U16 | FieldType::U32 => FieldValue::Uint(0),
            FieldType::F32 => FieldValue::Float(0.0),
            FieldType::Str(_) => FieldValue::Str(String::new()),
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    fn as_uint(&self) -> Option<u64> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            FieldValue::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Uint(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Uint(v.into())
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

/// One named field of a section: stable JSON name, type, buffer offset,
/// and the default written at registration time.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: SmolStr,
    pub ty: FieldType,
    pub offset: usize,
    pub default: FieldValue,
}

/// Packed layout of one section.
#[derive(Debug, Clone, Default)]
pub struct SectionLayout {
    pub fields: Vec<FieldDef>,
    pub size: usize,
}

impl SectionLayout {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Write every field's default value into `bytes`.
    pub fn write_defaults(&self, bytes: &mut [u8]) -> Result<(), SdsError> {
        for def in &self.fields {
            write_field(bytes, def, &def.default)?;
        }
        Ok(())
    }
}

/// Builds a `SectionLayout` by appending fields; offsets are assigned
/// sequentially with no padding.
#[derive(Debug, Default)]
pub struct SectionBuilder {
    fields: Vec<FieldDef>,
    offset: usize,
}

impl SectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(self, name: &str, ty: FieldType) -> Self {
        let default = FieldValue::zero_for(ty);
        self.field_with_default(name, ty, default)
    }

    pub fn field_with_default(
        mut self,
        name: &str,
        ty: FieldType,
        default: impl Into<FieldValue>,
    ) -> Self {
        let offset = self.offset;
        self.offset += ty.size();
        self.fields.push(FieldDef {
            name: SmolStr::new(name),
            ty,
            offset,
            default: default.into(),
        });
        self
    }

    pub fn build(self) -> SectionLayout {
        SectionLayout { fields: self.fields, size: self.offset }
    }
}

/// Read a field out of a section buffer. Strings stop at the first NUL
/// byte or at capacity. Multi-byte values use host byte order; the buffer
/// never crosses the wire as raw bytes.
pub fn read_field(bytes: &[u8], def: &FieldDef) -> FieldValue {
    let at = def.offset;
    match def.ty {
        FieldType::Bool => FieldValue::Bool(bytes[at] != 0),
        FieldType::I8 => FieldValue::Int((bytes[at] as i8).into()),
        FieldType::U8 => FieldValue::Uint(bytes[at].into()),
        FieldType::I16 => FieldValue::Int(i16::from_ne_bytes(take::<2>(bytes, at)).into()),
        FieldType::U16 => FieldValue::Uint(u16::from_ne_bytes(take::<2>(bytes, at)).into()),
        FieldType::I32 => FieldValue::Int(i32::from_ne_bytes(take::<4>(bytes, at)).into()),
        FieldType::U32 => FieldValue::Uint(u32::from_ne_bytes(take::<4>(bytes, at)).into()),
        FieldType::F32 => FieldValue::Float(f32::from_ne_bytes(take::<4>(bytes, at))),
        FieldType::Str(cap) => {
            let raw = &bytes[at..at + cap];
            let end = raw.iter().position(|&b| b == 0).unwrap_or(cap);
            FieldValue::Str(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
    }
}

fn take<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

/// Write a field into a section buffer.
///
/// Integer values must fit the target type; strings are truncated to
/// `cap - 1` bytes and the rest of the capacity is zeroed. Out-of-range or
/// wrongly-typed values are `TypeMismatch` and leave the buffer untouched.
pub fn write_field(bytes: &mut [u8], def: &FieldDef, value: &FieldValue) -> Result<(), SdsError> {
    let at = def.offset;
    let mismatch = || SdsError::TypeMismatch(def.name.to_string());
    match def.ty {
        FieldType::Bool => {
            let FieldValue::Bool(v) = value else { return Err(mismatch()) };
            bytes[at] = u8::from(*v);
        }
        FieldType::I8 => {
            let v = value.as_int().ok_or_else(mismatch)?;
            let v = i8::try_from(v).map_err(|_| mismatch())?;
            bytes[at] = v as u8;
        }
        FieldType::U8 => {
            let v = value.as_uint().ok_or_else(mismatch)?;
            let v = u8::try_from(v).map_err(|_| mismatch())?;
            bytes[at] = v;
        }
        FieldType::I16 => {
            let v = value.as_int().ok_or_else(mismatch)?;
            let v = i16::try_from(v).map_err(|_| mismatch())?;
            bytes[at..at + 2].copy_from_slice(&v.to_ne_bytes());
        }
        FieldType::U16 => {
            let v = value.as_uint().ok_or_else(mismatch)?;
            let v = u16::try_from(v).map_err(|_| mismatch())?;
            bytes[at..at + 2].copy_from_slice(&v.to_ne_bytes());
        }
        FieldType::I32 => {
            let v = value.as_int().ok_or_else(mismatch)?;
            let v = i32::try_from(v).map_err(|_| mismatch())?;
            bytes[at..at + 4].copy_from_slice(&v.to_ne_bytes());
        }
        FieldType::U32 => {
            let v = value.as_uint().ok_or_else(mismatch)?;
            let v = u32::try_from(v).map_err(|_| mismatch())?;
            bytes[at..at + 4].copy_from_slice(&v.to_ne_bytes());
        }
        FieldType::F32 => {
            let FieldValue::Float(v) = value else { return Err(mismatch()) };
            bytes[at..at + 4].copy_from_slice(&v.to_ne_bytes());
        }
        FieldType::Str(cap) => {
            let FieldValue::Str(s) = value else { return Err(mismatch()) };
            let region = &mut bytes[at..at + cap];
            region.fill(0);
            let len = s.len().min(cap.saturating_sub(1));
            region[..len].copy_from_slice(&s.as_bytes()[..len]);
        }
    }
    Ok(())
}

/// Compare one field between two buffers of the same layout.
///
/// Bytewise for everything except `F32`, which is changed only when the
/// difference exceeds `float_tol`.
pub fn fields_differ(a: &[u8], b: &[u8], def: &FieldDef, float_tol: f32) -> bool {
    if let FieldType::F32 = def.ty {
        let x = f32::from_ne_bytes(take::<4>(a, def.offset));
        let y = f32::from_ne_bytes(take::<4>(b, def.offset));
        return (x - y).abs() > float_tol;
    }
    let range = def.offset..def.offset + def.ty.size();
    a[range.clone()] != b[range]
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
