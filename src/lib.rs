use std::{
    fmt::Display,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    num::IntErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, info, trace, LevelFilter};
use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};
use simple_logger::SimpleLogger;

/// Largest value a multiplication operand may take.
pub const MAX_OPERAND: u32 = 999;

static INST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"mul\(([0-9]{1,3}),([0-9]{1,3})\)|do\(\)|don't\(\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("MalformedToken: malformed multiply instruction({0}), expect two operands.")]
    MalformedToken(String),
    #[error("OutOfRange: operand out of range in multiply instruction({0}), expect at most 999.")]
    OutOfRange(String),
    #[error("UnknownToken: unknown instruction({0}).")]
    UnknownToken(String),
}

#[derive(Debug, Parser)]
pub struct CLIArgs {
    /// Files to read, each one evaluated as its own section. Read standard input if none given.
    pub input_paths: Vec<PathBuf>,
    /// Raise log level on stderr, repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CLIArgs {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub fn init_logger(level: LevelFilter) -> Result<()> {
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Operand(u32);

impl TryFrom<u32> for Operand {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        if value > MAX_OPERAND {
            Err(value)
        } else {
            Ok(Self(value))
        }
    }
}

impl Operand {
    pub fn value(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Multiply(Operand, Operand),
    Toggle(bool),
}

impl Instruction {
    pub fn multiply(a: u32, b: u32) -> Option<Self> {
        let a = Operand::try_from(a).ok()?;
        let b = Operand::try_from(b).ok()?;
        Some(Self::Multiply(a, b))
    }

    pub fn product(a: Operand, b: Operand) -> u64 {
        u64::from(a.value()) * u64::from(b.value())
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Multiply(a, b) => write!(
                f,
                "Mul {{ a: Lit {{ value: {} }}, b: Lit {{ value: {} }} }}",
                a.value(),
                b.value()
            ),
            Instruction::Toggle(enabled) => write!(f, "Do {{ value: {} }}", u8::from(*enabled)),
        }
    }
}

impl TryFrom<&Captures<'_>> for Instruction {
    type Error = Error;

    fn try_from(caps: &Captures<'_>) -> std::result::Result<Self, Self::Error> {
        let text = &caps[0];
        if text.contains("mul") {
            // Both groups are mandatory in the default pattern, other patterns may skip them.
            let (Some(a), Some(b)) = (caps.get(1), caps.get(2)) else {
                return Err(Error::MalformedToken(text.to_string()));
            };
            let a = read_operand(text, a)?;
            let b = read_operand(text, b)?;
            Instruction::multiply(a, b).ok_or_else(|| Error::OutOfRange(text.to_string()))
        } else if text.contains("don't") {
            Ok(Instruction::Toggle(false))
        } else if text.contains("do") {
            Ok(Instruction::Toggle(true))
        } else {
            Err(Error::UnknownToken(text.to_string()))
        }
    }
}

fn read_operand(text: &str, operand: Match<'_>) -> std::result::Result<u32, Error> {
    operand.as_str().parse::<u32>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => Error::OutOfRange(text.to_string()),
        _ => Error::MalformedToken(text.to_string()),
    })
}

/// Turns text into instructions, one per non-overlapping match of its pattern.
#[derive(Debug, Clone)]
pub struct Lexer {
    pattern: Regex,
}

impl Default for Lexer {
    fn default() -> Self {
        Self {
            pattern: INST_PATTERN.clone(),
        }
    }
}

impl Lexer {
    pub fn with_pattern(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn tokenize<'a>(
        &'a self,
        line: &'a str,
    ) -> impl Iterator<Item = std::result::Result<Instruction, Error>> + 'a {
        lex_matches(&self.pattern, line)
    }
}

/// Lexes `line` with the default instruction pattern.
pub fn tokenize(line: &str) -> impl Iterator<Item = std::result::Result<Instruction, Error>> + '_ {
    lex_matches(&INST_PATTERN, line)
}

fn lex_matches<'a>(
    pattern: &'a Regex,
    line: &'a str,
) -> impl Iterator<Item = std::result::Result<Instruction, Error>> + 'a {
    pattern.captures_iter(line).map(|caps| {
        let inst = Instruction::try_from(&caps);
        trace!("Lexed {:?} from text({}).", inst, &caps[0]);
        inst
    })
}

/// Enable flag and running sum of the multiplications seen while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    enabled: bool,
    sum: u64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            enabled: true,
            sum: 0,
        }
    }

    pub fn step(&mut self, inst: &Instruction) {
        match inst {
            Instruction::Toggle(enabled) => self.enabled = *enabled,
            Instruction::Multiply(a, b) => {
                if self.enabled {
                    self.sum += Instruction::product(*a, *b);
                }
            }
        }
    }

    /// Evaluates `insts` in order, writing each one's trace line before evaluating it.
    pub fn run<'a, I, W>(&mut self, insts: I, mut trace: W) -> io::Result<u64>
    where
        I: IntoIterator<Item = &'a Instruction>,
        W: Write,
    {
        for inst in insts {
            writeln!(trace, "{}", inst)?;
            self.step(inst);
        }

        Ok(self.sum)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sum(&self) -> u64 {
        self.sum
    }
}

/// Instructions read from one input source, in the order they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    insts: Vec<Instruction>,
}

impl From<Vec<Instruction>> for Section {
    fn from(insts: Vec<Instruction>) -> Self {
        Self { insts }
    }
}

impl Section {
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut insts = Vec::new();
        for (ind, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {} of input.", ind + 1))?;
            for inst in tokenize(&line) {
                insts.push(inst.with_context(|| {
                    format!("Failed to read instruction in line {} of input.", ind + 1)
                })?);
            }
        }
        debug!("Read {} instructions.", insts.len());

        Ok(Self { insts })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    /// Sums every multiplication, toggles ignored.
    pub fn unconditional_sum(&self) -> u64 {
        self.insts
            .iter()
            .map(|inst| match inst {
                Instruction::Multiply(a, b) => Instruction::product(*a, *b),
                Instruction::Toggle(_) => 0,
            })
            .sum()
    }

    /// Evaluates from a fresh state, toggles in earlier sections have no effect here.
    pub fn evaluate<W: Write>(&self, trace: W) -> io::Result<u64> {
        Evaluator::new().run(&self.insts, trace)
    }
}

pub fn read_section<P: AsRef<Path>>(path: P) -> Result<Section> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open given file({}).", path.as_ref().display()))?;
    Section::read(BufReader::new(file)).with_context(|| {
        format!(
            "Failed to read instructions from given file({}).",
            path.as_ref().display()
        )
    })
}

/// Reads one section per path, or a single section from standard input if `paths` is empty.
pub fn read_sections(paths: &[PathBuf]) -> Result<Vec<Section>> {
    if paths.is_empty() {
        let stdin = io::stdin();
        let section = Section::read(stdin.lock())
            .context("Failed to read instructions from standard input.")?;
        return Ok(vec![section]);
    }

    paths.iter().map(read_section).collect()
}

/// Writes each section's trace and sum, then the total of all sections, which is also returned.
pub fn report<W: Write>(sections: &[Section], mut out: W) -> io::Result<u64> {
    let mut supersomme = 0;
    for (ind, section) in sections.iter().enumerate() {
        let sum = section.evaluate(&mut out)?;
        writeln!(out, "{}", sum)?;
        info!("Section #{} sums to {}.", ind + 1, sum);
        supersomme += sum;
    }
    writeln!(out, "{}", supersomme)?;

    Ok(supersomme)
}
