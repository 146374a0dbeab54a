use cards2csv::{process_dataset, AnnotationParser, CocoArgs, CocoParser, DatasetOutcome, ImageFailurePolicy};
use clap::Parser;
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CocoArgs::parse();

    if !args.dataset.is_dir() {
        error!("The specified dataset does not exist: {}", args.dataset.display());
        return;
    }

    let parser = CocoParser::new(&args.dataset, !args.raw_labels);
    let policy = ImageFailurePolicy::resolve(args.on_image_failure, parser.format());

    info!("Starting the conversion process...");
    match process_dataset(&parser, policy, &args.output_dir()) {
        Ok(DatasetOutcome::Written { path, rows }) => {
            info!("Conversion completed: {} rows written to {}", rows, path.display())
        }
        Ok(DatasetOutcome::NoData) => {}
        Err(e) => error!("Failed to write dataset: {}", e),
    }
}
