use anyhow::Result;
use clap::Parser;
use mul_toggle::CLIArgs;

fn main() -> Result<()> {
    let args = CLIArgs::parse();
    mul_toggle::init_logger(args.log_level())?;
    let sections = mul_toggle::read_sections(&args.input_paths)?;

    let sum = sections.iter().map(|s| s.unconditional_sum()).sum::<u64>();
    println!("The total sum of all multiply instructions is {}.", sum);

    Ok(())
}
