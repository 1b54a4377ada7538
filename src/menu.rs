//! Interactive selector loop.
//!
//! The menu is generic over its input and output so that a whole session can
//! be scripted in tests. Invalid dimensions, block sizes, selectors and
//! non-numeric lines are reported and the menu asks again; allocation and I/O
//! failures end the session.

use std::io::{BufRead, Write};

use log::warn;

use crate::{
    bench::{self, BenchConfig},
    error::{invalid_input, unrecognized_selector, MatprodError, Result},
    matmul::{validate_block_size, validate_dimension, Strategy},
};

const MENU: &str = "
1. Multiplication
2. Line Multiplication
3. Block Multiplication
4. Line Multiplication Parallel V1
5. Line Multiplication Parallel V2
0. Exit
";

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Exit,
    Naive,
    Line,
    Block,
    ParallelRows,
    ParallelColumns,
}

impl TryFrom<i64> for Selector {
    type Error = MatprodError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Selector::Exit),
            1 => Ok(Selector::Naive),
            2 => Ok(Selector::Line),
            3 => Ok(Selector::Block),
            4 => Ok(Selector::ParallelRows),
            5 => Ok(Selector::ParallelColumns),
            other => Err(unrecognized_selector(other)),
        }
    }
}

/// Whether the loop keeps going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    config: BenchConfig,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, config: BenchConfig) -> Self {
        Menu {
            input,
            output,
            config,
        }
    }

    /// Runs until `0` is selected or the input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.step() {
                Ok(Flow::Exit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e) if e.is_recoverable() => {
                    warn!("{e}");
                    writeln!(self.output, "Error: {e}")?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Consumes the menu and hands back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn step(&mut self) -> Result<Flow> {
        write!(self.output, "{MENU}")?;
        let Some(selection) = self.prompt("Selection?: ")? else {
            return Ok(Flow::Exit);
        };
        let selector = Selector::try_from(selection)?;
        if selector == Selector::Exit {
            return Ok(Flow::Exit);
        }

        let Some(dimension) = self.prompt("Dimensions: lins=cols ? ")? else {
            return Ok(Flow::Exit);
        };
        let n = validate_dimension(dimension)?;

        let strategy = match selector {
            Selector::Naive => Strategy::Naive,
            Selector::Line => Strategy::Line,
            Selector::Block => {
                let Some(block_size) = self.prompt("Block Size? ")? else {
                    return Ok(Flow::Exit);
                };
                Strategy::Block {
                    block_size: validate_block_size(block_size, n)?,
                }
            }
            Selector::ParallelRows => Strategy::ParallelRows,
            Selector::ParallelColumns => Strategy::ParallelColumns,
            Selector::Exit => return Ok(Flow::Exit),
        };

        let report = bench::run(strategy, n, &self.config)?;
        write!(self.output, "{report}")?;
        self.output.flush()?;
        Ok(Flow::Continue)
    }

    /// Writes `prompt` and reads one integer. `None` means end of input.
    fn prompt(&mut self, prompt: &str) -> Result<Option<i64>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        line.parse::<i64>()
            .map(Some)
            .map_err(|_| invalid_input(line))
    }
}

/// Builds the run configuration from the command-line arguments (program name
/// excluded). The only accepted argument is an optional worker count.
pub fn config_from_args<I>(args: I) -> Result<BenchConfig>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let config = BenchConfig::default();
    let config = match args.next() {
        None => config,
        Some(threads) => match threads.parse::<usize>() {
            Ok(t) if t > 0 => config.with_threads(t),
            _ => return Err(invalid_input(threads)),
        },
    };
    if let Some(extra) = args.next() {
        return Err(invalid_input(extra));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(script: &str) -> (Result<()>, String) {
        let mut menu = Menu::new(script.as_bytes(), Vec::new(), BenchConfig::default());
        let result = menu.run();
        let output = String::from_utf8(menu.into_output()).unwrap();
        (result, output)
    }

    #[test]
    fn test_selector_mapping() {
        assert_eq!(Selector::try_from(0).unwrap(), Selector::Exit);
        assert_eq!(Selector::try_from(3).unwrap(), Selector::Block);
        assert_eq!(Selector::try_from(5).unwrap(), Selector::ParallelColumns);
        assert!(matches!(
            Selector::try_from(6),
            Err(MatprodError::UnrecognizedSelector { selector: 6 })
        ));
        assert!(Selector::try_from(-1).is_err());
    }

    #[test]
    fn test_exit_immediately() {
        let (result, output) = session("0\n");
        assert!(result.is_ok());
        assert!(output.contains("0. Exit"));
        assert!(!output.contains("Dimensions"));
    }

    #[test]
    fn test_end_of_input_exits() {
        let (result, output) = session("");
        assert!(result.is_ok());
        assert!(output.ends_with("Selection?: "));
    }

    #[test]
    fn test_naive_run() {
        let (result, output) = session("1\n2\n0\n");
        assert!(result.is_ok());
        assert!(output.contains("Time: "));
        assert!(output.contains("Result matrix:\n3 3 \n"));
    }

    #[test]
    fn test_block_prompts_for_size() {
        let (result, output) = session("3\n3\n2\n0\n");
        assert!(result.is_ok());
        assert!(output.contains("Block Size? "));
        assert!(output.contains("Result matrix:\n6 6 6 \n"));
    }

    #[test]
    fn test_invalid_inputs_reprompt() {
        let (result, output) = session("2\n0\n2\n-5\n3\n4\n0\n9\nabc\n0\n");
        assert!(result.is_ok());
        assert!(output.contains("Error: Invalid dimension: 0"));
        assert!(output.contains("Error: Invalid dimension: -5"));
        assert!(output.contains("Error: Invalid block size: 0"));
        assert!(output.contains("Error: Unrecognized selection: 9"));
        assert!(output.contains("Error: Invalid input: \"abc\""));
        assert!(!output.contains("Time: "));
    }

    #[test]
    fn test_config_from_args() {
        assert_eq!(config_from_args(Vec::new()).unwrap(), BenchConfig::default());
        assert_eq!(
            config_from_args(vec!["4".to_string()]).unwrap().threads,
            Some(4)
        );
        assert!(config_from_args(vec!["0".to_string()]).is_err());
        assert!(config_from_args(vec!["many".to_string()]).is_err());
        assert!(config_from_args(vec!["2".to_string(), "3".to_string()]).is_err());
    }
}
