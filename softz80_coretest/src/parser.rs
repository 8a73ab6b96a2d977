use std::{
    fmt,
    io::{BufRead, Lines},
};

use softz80_lib::Registers;

use crate::test_case::{Patch, TestCase};

/// Sentinel closing a memory-patch record and, alone on a line, the whole
/// memory-patch section. Checked before any numeric parsing.
const SENTINEL: &str = "-1";

#[derive(Debug)]
pub enum FormatError {
    Io(std::io::Error),
    /// The stream ended in the middle of a test record.
    UnexpectedEof { test: String },
    FieldCount {
        test: String,
        line: &'static str,
        expected: usize,
        found: usize,
    },
    BadNumber {
        test: String,
        field: &'static str,
        token: String,
    },
    /// A memory-patch line with no address token.
    MissingAddress { test: String },
    /// A patch run crossing the end of the address space. Wraparound is
    /// never implied; it must be encoded as a separate record.
    AddressOverflow { test: String, address: u16 },
    BadInterruptMode { test: String, value: u8 },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "reading test input: {error}"),
            Self::UnexpectedEof { test } => {
                write!(f, "test {test}: input ended mid-record")
            }
            Self::FieldCount {
                test,
                line,
                expected,
                found,
            } => write!(
                f,
                "test {test}: {line} line has {found} fields, expected {expected}"
            ),
            Self::BadNumber { test, field, token } => {
                write!(f, "test {test}: invalid {field} value '{token}'")
            }
            Self::MissingAddress { test } => {
                write!(f, "test {test}: no address found on memory patch line")
            }
            Self::AddressOverflow { test, address } => write!(
                f,
                "test {test}: memory patch at #0x{address:04x} runs past the address space"
            ),
            Self::BadInterruptMode { test, value } => {
                write!(f, "test {test}: interrupt mode {value} out of range")
            }
        }
    }
}

impl std::error::Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

fn parse_word(test: &str, field: &'static str, token: &str) -> Result<u16, FormatError> {
    u16::from_str_radix(token, 16).map_err(|_| FormatError::BadNumber {
        test: test.to_string(),
        field,
        token: token.to_string(),
    })
}

fn parse_byte(test: &str, field: &'static str, token: &str) -> Result<u8, FormatError> {
    hex::decode(token)
        .ok()
        .filter(|bytes| bytes.len() == 1)
        .map(|bytes| bytes[0])
        .ok_or_else(|| FormatError::BadNumber {
            test: test.to_string(),
            field,
            token: token.to_string(),
        })
}

fn parse_decimal<T: std::str::FromStr>(
    test: &str,
    field: &'static str,
    token: &str,
) -> Result<T, FormatError> {
    token.parse().map_err(|_| FormatError::BadNumber {
        test: test.to_string(),
        field,
        token: token.to_string(),
    })
}

/*
 * TestReader
 * Pulls FUSE-format test vectors off a line-oriented stream, one at a time.
 * End of input while expecting a test name is the normal batch terminator
 * and surfaces as Ok(None); everything else that cuts a record short is a
 * FormatError, which the caller must treat as fatal for the whole batch
 * since there is no way to resynchronize on the next test boundary.
 */
pub struct TestReader<B>
where
    B: BufRead,
{
    lines: Lines<B>,
}

impl<B> TestReader<B>
where
    B: BufRead,
{
    pub fn new(input: B) -> Self {
        Self {
            lines: input.lines(),
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, FormatError> {
        self.lines.next().transpose().map_err(FormatError::from)
    }

    fn expect_line(&mut self, test: &str) -> Result<String, FormatError> {
        self.next_line()?.ok_or_else(|| FormatError::UnexpectedEof {
            test: test.to_string(),
        })
    }

    pub fn next_test(&mut self) -> Result<Option<TestCase>, FormatError> {
        let name = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        break trimmed.to_string();
                    }
                }
            }
        };

        let mut registers = self.parse_register_line(&name)?;
        let target_tstates = self.parse_state_line(&name, &mut registers)?;
        let patches = self.parse_patches(&name)?;

        Ok(Some(TestCase {
            name,
            registers,
            target_tstates,
            patches,
        }))
    }

    /// AF BC DE HL AF' BC' DE' HL' IX IY SP PC, 12 hex fields.
    fn parse_register_line(&mut self, test: &str) -> Result<Registers, FormatError> {
        let line = self.expect_line(test)?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() != 12 {
            return Err(FormatError::FieldCount {
                test: test.to_string(),
                line: "register",
                expected: 12,
                found: fields.len(),
            });
        }

        let mut registers = Registers::default();
        registers.set_af(parse_word(test, "AF", fields[0])?);
        registers.set_bc(parse_word(test, "BC", fields[1])?);
        registers.set_de(parse_word(test, "DE", fields[2])?);
        registers.set_hl(parse_word(test, "HL", fields[3])?);
        registers.set_af_alt(parse_word(test, "AF'", fields[4])?);
        registers.set_bc_alt(parse_word(test, "BC'", fields[5])?);
        registers.set_de_alt(parse_word(test, "DE'", fields[6])?);
        registers.set_hl_alt(parse_word(test, "HL'", fields[7])?);
        registers.ix = parse_word(test, "IX", fields[8])?;
        registers.iy = parse_word(test, "IY", fields[9])?;
        registers.sp = parse_word(test, "SP", fields[10])?;
        registers.pc = parse_word(test, "PC", fields[11])?;

        Ok(registers)
    }

    /// I R IFF1 IFF2 IM halted target-tstates. I and R are hexadecimal,
    /// the rest decimal. Returns the target t-state count.
    fn parse_state_line(
        &mut self,
        test: &str,
        registers: &mut Registers,
    ) -> Result<u64, FormatError> {
        let line = self.expect_line(test)?;
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() != 7 {
            return Err(FormatError::FieldCount {
                test: test.to_string(),
                line: "state",
                expected: 7,
                found: fields.len(),
            });
        }

        registers.i = parse_byte(test, "I", fields[0])?;
        registers.r = parse_byte(test, "R", fields[1])?;
        registers.iff1 = parse_decimal::<u8>(test, "IFF1", fields[2])? != 0;
        registers.iff2 = parse_decimal::<u8>(test, "IFF2", fields[3])? != 0;
        let im = parse_decimal::<u8>(test, "IM", fields[4])?;
        if im > 2 {
            return Err(FormatError::BadInterruptMode {
                test: test.to_string(),
                value: im,
            });
        }
        registers.im = im;
        registers.halted = parse_decimal::<u8>(test, "halted", fields[5])? != 0;

        parse_decimal(test, "tstates", fields[6])
    }

    /// Each line is `<addr> <byte> ... -1`; the sentinel may also close the
    /// record at end of line. A line starting with the sentinel closes the
    /// whole section.
    fn parse_patches(&mut self, test: &str) -> Result<Vec<Patch>, FormatError> {
        let mut patches = Vec::new();

        loop {
            let line = self.expect_line(test)?;
            let mut tokens = line.split_whitespace();
            let first = tokens.next().ok_or_else(|| FormatError::MissingAddress {
                test: test.to_string(),
            })?;

            if first == SENTINEL {
                break;
            }

            let address = parse_word(test, "patch address", first)?;
            let mut bytes = Vec::new();
            let mut cursor = address as usize;

            for token in tokens {
                if token == SENTINEL {
                    break;
                }
                if cursor > 0xffff {
                    return Err(FormatError::AddressOverflow {
                        test: test.to_string(),
                        address,
                    });
                }
                bytes.push(parse_byte(test, "patch byte", token)?);
                cursor += 1;
            }

            patches.push(Patch { address, bytes });
        }

        Ok(patches)
    }
}
