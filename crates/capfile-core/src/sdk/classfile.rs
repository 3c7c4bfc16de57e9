//! Minimal Java class file scanner.
//!
//! Lists the methods a class declares (name and descriptor). That is all the
//! SDK probe needs to tell verifier revisions apart, so fields, attributes
//! and code are skipped without interpretation.

use crate::reader::{ByteReader, OutOfBounds};
use crate::{Error, Result};

const CLASS_MAGIC: u32 = 0xCAFE_BABE;

// Constant pool tags
pub(crate) const CONSTANT_UTF8: u8 = 1;
const CONSTANT_INTEGER: u8 = 3;
const CONSTANT_FLOAT: u8 = 4;
const CONSTANT_LONG: u8 = 5;
const CONSTANT_DOUBLE: u8 = 6;
pub(crate) const CONSTANT_CLASS: u8 = 7;
pub(crate) const CONSTANT_STRING: u8 = 8;
pub(crate) const CONSTANT_FIELDREF: u8 = 9;
pub(crate) const CONSTANT_METHODREF: u8 = 10;
const CONSTANT_INTERFACE_METHODREF: u8 = 11;
pub(crate) const CONSTANT_NAME_AND_TYPE: u8 = 12;
const CONSTANT_METHOD_HANDLE: u8 = 15;
const CONSTANT_METHOD_TYPE: u8 = 16;
const CONSTANT_DYNAMIC: u8 = 17;
const CONSTANT_INVOKE_DYNAMIC: u8 = 18;
const CONSTANT_MODULE: u8 = 19;
const CONSTANT_PACKAGE: u8 = 20;

/// A method declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MethodSignature {
    pub(crate) name: String,
    pub(crate) descriptor: String,
}

impl MethodSignature {
    /// Whether this method has `name` and parameter list `params`
    /// (e.g. `"(Ljava/lang/String;)"`), whatever its return type.
    pub(crate) fn matches(&self, name: &str, params: &str) -> bool {
        self.name == name && self.descriptor.starts_with(params)
    }
}

fn malformed(e: OutOfBounds) -> Error {
    Error::Toolchain(format!("Malformed class file: {e}"))
}

/// Declared methods of the class in `bytes`.
pub(crate) fn declared_methods(bytes: &[u8]) -> Result<Vec<MethodSignature>> {
    let mut r = ByteReader::new(bytes);

    if r.read_u32().map_err(malformed)? != CLASS_MAGIC {
        return Err(Error::Toolchain("Not a Java class file".into()));
    }
    r.skip(4).map_err(malformed)?; // minor, major

    let pool = read_constant_pool(&mut r)?;
    let utf8 = |index: u16| -> Result<String> {
        pool.get(usize::from(index))
            .and_then(Option::as_ref)
            .cloned()
            .ok_or_else(|| Error::Toolchain(format!("Bad constant pool reference {index}")))
    };

    r.skip(6).map_err(malformed)?; // access_flags, this_class, super_class
    let interfaces = r.read_u16().map_err(malformed)?;
    r.skip(usize::from(interfaces) * 2).map_err(malformed)?;

    let fields = r.read_u16().map_err(malformed)?;
    for _ in 0..fields {
        r.skip(6).map_err(malformed)?;
        skip_attributes(&mut r)?;
    }

    let count = r.read_u16().map_err(malformed)?;
    let mut methods = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        r.skip(2).map_err(malformed)?; // access_flags
        let name = r.read_u16().map_err(malformed)?;
        let descriptor = r.read_u16().map_err(malformed)?;
        skip_attributes(&mut r)?;
        methods.push(MethodSignature {
            name: utf8(name)?,
            descriptor: utf8(descriptor)?,
        });
    }
    Ok(methods)
}

/// Constant pool as a table indexed from 1; only UTF-8 entries are kept.
fn read_constant_pool(r: &mut ByteReader<'_>) -> Result<Vec<Option<String>>> {
    let count = usize::from(r.read_u16().map_err(malformed)?);
    let mut pool = vec![None; count.max(1)];
    let mut index = 1;
    while index < count {
        let tag = r.read_u8().map_err(malformed)?;
        match tag {
            CONSTANT_UTF8 => {
                let len = r.read_u16().map_err(malformed)?;
                let bytes = r.read_bytes(usize::from(len)).map_err(malformed)?;
                // Modified UTF-8; lossy is fine for ASCII identifiers
                pool[index] = Some(String::from_utf8_lossy(bytes).into_owned());
            }
            CONSTANT_CLASS | CONSTANT_STRING | CONSTANT_METHOD_TYPE | CONSTANT_MODULE
            | CONSTANT_PACKAGE => r.skip(2).map_err(malformed)?,
            CONSTANT_METHOD_HANDLE => r.skip(3).map_err(malformed)?,
            CONSTANT_INTEGER
            | CONSTANT_FLOAT
            | CONSTANT_FIELDREF
            | CONSTANT_METHODREF
            | CONSTANT_INTERFACE_METHODREF
            | CONSTANT_NAME_AND_TYPE
            | CONSTANT_DYNAMIC
            | CONSTANT_INVOKE_DYNAMIC => r.skip(4).map_err(malformed)?,
            CONSTANT_LONG | CONSTANT_DOUBLE => {
                r.skip(8).map_err(malformed)?;
                // 8-byte constants take two slots
                index += 1;
            }
            other => {
                return Err(Error::Toolchain(format!(
                    "Unknown constant pool tag {other} at entry {index}"
                )));
            }
        }
        index += 1;
    }
    Ok(pool)
}

fn skip_attributes(r: &mut ByteReader<'_>) -> Result<()> {
    let count = r.read_u16().map_err(malformed)?;
    for _ in 0..count {
        r.skip(2).map_err(malformed)?;
        let len = r.read_u32().map_err(malformed)?;
        r.skip(len as usize).map_err(malformed)?;
    }
    Ok(())
}
