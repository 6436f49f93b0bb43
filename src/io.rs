use std::fs;
use std::path::Path;

use crate::constants::Word;
use crate::memory::BackingStore;
use crate::vm_manager::VirtualMemory;

/// One operation of an access trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Read(u64),
    Write(u64, Word),
}

/// Result of running one [`Op`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Read(Word),
    Written,
    Rejected,
}

impl Outcome {
    /// Convert to the output format (-1 for rejected addresses)
    pub fn to_output(&self) -> String {
        match self {
            Outcome::Read(value) => value.to_string(),
            Outcome::Written => "ok".to_string(),
            Outcome::Rejected => "-1".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Trace {
    pub ops: Vec<Op>,
}

impl Trace {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read trace file: {}", e))?;
        Self::parse(&content)
    }

    /// Parse `r <address>` and `w <address> <value>` lines. Blank lines and
    /// `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut ops = Vec::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let op = Self::parse_line(line).map_err(|e| format!("line {}: {}", number + 1, e))?;
            ops.push(op);
        }

        Ok(Trace { ops })
    }

    fn parse_line(line: &str) -> Result<Op, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["r", address] => Ok(Op::Read(parse_address(address)?)),
            ["w", address, value] => {
                let value: Word = parse_number(value)
                    .and_then(|v| Word::try_from(v).ok())
                    .ok_or_else(|| format!("Invalid value: {}", value))?;
                Ok(Op::Write(parse_address(address)?, value))
            }
            _ => Err(format!("Expected 'r <address>' or 'w <address> <value>', got '{}'", line)),
        }
    }
}

fn parse_number(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (radix, digits) = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // Only one leading sign, and only before the radix prefix
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn parse_address(token: &str) -> Result<u64, String> {
    parse_number(token)
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| format!("Invalid virtual address: {}", token))
}

/// Run every operation in order; out-of-range addresses become `Rejected`
pub fn run_trace<S: BackingStore>(vm: &mut VirtualMemory<S>, trace: &Trace) -> Vec<Outcome> {
    trace
        .ops
        .iter()
        .map(|&op| {
            let result = match op {
                Op::Read(address) => vm.read(address).map(Outcome::Read),
                Op::Write(address, value) => vm.write(address, value).map(|()| Outcome::Written),
            };
            result.unwrap_or_else(|e| {
                log::warn!("{:?} failed: {}", op, e);
                Outcome::Rejected
            })
        })
        .collect()
}

pub fn format_results(results: &[Outcome]) -> String {
    let mut output: Vec<String> = results.iter().map(Outcome::to_output).collect();
    output.push(String::new());
    output.join("\n")
}

pub fn write_results<P: AsRef<Path>>(path: P, results: &[Outcome]) -> Result<(), String> {
    fs::write(path.as_ref(), format_results(results))
        .map_err(|e| format!("Failed to write output file: {}", e))
}
