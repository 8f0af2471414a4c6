use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::bytecode::compile_error::CompileError;

/// Size of the object file header: magic, code size, data size, entry.
pub const HEADER_SIZE: usize = 14;

const MAGIC: [u8; 2] = *b"MJ";

/// An executable MicroJava object file.
///
/// Layout (all integers big-endian):
/// `'M' 'J'`, code size (i32), data size in words (i32), entry pc (i32),
/// followed by the code bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data_size: i32,
    /// Offset of `main`'s `enter`, or -1 if the program has no `main`.
    pub main_pc: i32,
    pub code: Vec<u8>,
}

impl Image {
    pub fn code_size(&self) -> i32 {
        self.code.len() as i32
    }

    pub fn write(&self, out: &mut impl Write) -> Result<(), CompileError> {
        out.write_all(&MAGIC)?;
        out.write_all(&self.code_size().to_be_bytes())?;
        out.write_all(&self.data_size.to_be_bytes())?;
        out.write_all(&self.main_pc.to_be_bytes())?;
        out.write_all(&self.code)?;
        out.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.code.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.code_size().to_be_bytes());
        bytes.extend_from_slice(&self.data_size.to_be_bytes());
        bytes.extend_from_slice(&self.main_pc.to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes
    }

    /// Parses and validates an object file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Image, CompileError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CompileError::invalid_image(format!(
                "header truncated ({} of {} bytes)",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        if bytes[0..2] != MAGIC {
            return Err(CompileError::invalid_image("missing 'MJ' magic"));
        }

        let word = |at: usize| i32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let code_size = word(2);
        let data_size = word(6);
        let main_pc = word(10);

        let code = &bytes[HEADER_SIZE..];
        if code_size < 0 || code.len() != code_size as usize {
            return Err(CompileError::invalid_image(format!(
                "header announces {} code bytes, found {}",
                code_size,
                code.len()
            )));
        }
        if main_pc >= code_size {
            return Err(CompileError::invalid_image(format!(
                "entry point {} outside code",
                main_pc
            )));
        }

        Ok(Image {
            data_size,
            main_pc,
            code: code.to_vec(),
        })
    }
}

/// Method entry recorded in the debug info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub entry: u32,
    pub n_pars: u32,
    pub n_locals: u32,
}

/// Names for the addresses of an image, stored in a postcard-encoded
/// sidecar file next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub program: String,
    /// Global variable names, indexed by static address.
    pub globals: Vec<String>,
    /// Methods in declaration order.
    pub methods: Vec<MethodInfo>,
}

impl DebugInfo {
    pub fn encode(&self) -> Result<Vec<u8>, CompileError> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<DebugInfo, CompileError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    /// Name of the method starting at `pc`.
    pub fn method_at(&self, pc: usize) -> Option<&str> {
        self.methods
            .iter()
            .find(|m| m.entry as usize == pc)
            .map(|m| m.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Image {
        Image {
            data_size: 1,
            main_pc: 0,
            code: vec![51, 0, 0, 52, 50],
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[0..2], b"MJ");
        assert_eq!(&bytes[2..6], &[0, 0, 0, 5]);
        assert_eq!(&bytes[6..10], &[0, 0, 0, 1]);
        assert_eq!(&bytes[10..14], &[0, 0, 0, 0]);
        assert_eq!(&bytes[14..], &[51, 0, 0, 52, 50]);
    }

    #[test]
    fn test_write_matches_to_bytes() {
        let image = sample();
        let mut out = Vec::new();
        image.write(&mut out).expect("write to vec");
        assert_eq!(out, image.to_bytes());
    }

    #[test]
    fn test_missing_main_is_minus_one() {
        let image = Image {
            data_size: 0,
            main_pc: -1,
            code: Vec::new(),
        };
        assert_eq!(&image.to_bytes()[10..14], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_from_bytes_reads_header() {
        let parsed = Image::from_bytes(&sample().to_bytes()).expect("valid image");
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_from_bytes_rejects_bad_input() {
        assert!(Image::from_bytes(b"MJ").is_err());

        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(Image::from_bytes(&bytes), Err(CompileError::InvalidImage(_))));

        let mut bytes = sample().to_bytes();
        bytes.pop();
        let err = Image::from_bytes(&bytes).map(|_| ()).unwrap_err();
        assert!(err.to_string().contains("announces 5 code bytes, found 4"));
    }

    #[test]
    fn test_debug_info_survives_encoding() {
        let info = DebugInfo {
            program: "P".to_string(),
            globals: vec!["x".to_string()],
            methods: vec![MethodInfo {
                name: "main".to_string(),
                entry: 0,
                n_pars: 0,
                n_locals: 2,
            }],
        };
        let bytes = info.encode().expect("encode");
        let back = DebugInfo::decode(&bytes).expect("decode");
        assert_eq!(back, info);
        assert_eq!(back.method_at(0), Some("main"));
        assert_eq!(back.method_at(3), None);
    }

    #[test]
    fn test_debug_info_rejects_garbage() {
        assert!(matches!(
            DebugInfo::decode(&[0xff, 0xff, 0xff]),
            Err(CompileError::DebugInfo(_))
        ));
    }
}
