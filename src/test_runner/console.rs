//! gtest-style console output

use std::io::{self, Write};

const GREEN: &str = "\x1b[0;32m";
const RED: &str = "\x1b[0;31m";
const END: &str = "\x1b[0m";

/// Writes tagged progress lines, colorized when enabled.
pub struct Console<'a> {
    out: &'a mut dyn Write,
    colors: bool,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write, colors: bool) -> Self {
        Self { out, colors }
    }

    fn tagged(&mut self, color: &str, tag: &str, info: &str) -> io::Result<()> {
        if self.colors {
            writeln!(self.out, "{}{}{} {}", color, tag, END, info)?;
        } else {
            writeln!(self.out, "{} {}", tag, info)?;
        }
        self.out.flush()
    }

    pub fn info_h1(&mut self, info: &str) -> io::Result<()> {
        self.tagged(GREEN, "[==========]", info)
    }

    pub fn info_h2(&mut self, info: &str) -> io::Result<()> {
        self.tagged(GREEN, "[----------]", info)
    }

    pub fn run_start(&mut self, info: &str) -> io::Result<()> {
        self.tagged(GREEN, "[ RUN      ]", info)
    }

    pub fn run_ok(&mut self, info: &str) -> io::Result<()> {
        self.tagged(GREEN, "[       OK ]", info)
    }

    pub fn run_failed(&mut self, info: &str) -> io::Result<()> {
        self.tagged(RED, "[  FAILED  ]", info)
    }

    pub fn passed(&mut self, info: &str) -> io::Result<()> {
        self.tagged(GREEN, "[  PASSED  ]", info)
    }

    pub fn failed(&mut self, info: &str) -> io::Result<()> {
        self.tagged(RED, "[  FAILED  ]", info)
    }

    /// Untagged line
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()
    }
}

/// "test" or "tests" depending on `count`
pub fn test_word(count: usize) -> &'static str {
    if count == 1 {
        "test"
    } else {
        "tests"
    }
}

/// "suite" or "suites" depending on `count`
pub fn suite_word(count: usize) -> &'static str {
    if count == 1 {
        "suite"
    } else {
        "suites"
    }
}
