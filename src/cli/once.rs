use crate::{config::CleanerConfig, coordinator::MultiCleaner, errors::Result, unit::Tick};

pub async fn run(config: CleanerConfig) -> Result<()> {
    let multi_cleaner = MultiCleaner::new(&config)?;
    println!(
        "Running a single cleaning pass on {} root(s)...",
        multi_cleaner.units().len()
    );

    let mut failed = 0;
    for (root, tick) in multi_cleaner.tick_all().await {
        match tick {
            Tick::Completed(report) => println!(
                "{}: {}, dropped {} entries",
                root.display(),
                report.outcome,
                report.dropped
            ),
            Tick::Failed(e) => {
                failed += 1;
                eprintln!("{}: failed ({}): {e}", root.display(), e.kind());
            }
            Tick::Skipped => println!("{}: skipped", root.display()),
        }
    }

    if failed > 0 {
        eprintln!("Cleaning failed for {failed} root(s)");
        std::process::exit(1);
    }
    println!("Cleaning completed");

    Ok(())
}
