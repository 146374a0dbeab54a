use cards2csv::voc::{VocCsvParser, VocCsvSource};
use cards2csv::{process_dataset, AnnotationParser, DatasetOutcome, ImageFailurePolicy, VocArgs};
use clap::Parser;
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = VocArgs::parse();

    for (name, path) in [("train_csv", &args.train_csv), ("test_csv", &args.test_csv)] {
        if !path.is_file() {
            error!("The specified {} does not exist: {}", name, path.display());
            return;
        }
    }

    let parser = VocCsvParser::new(
        VocCsvSource::new(&args.train_csv, &args.train_dir),
        VocCsvSource::new(&args.test_csv, &args.test_dir),
        args.convert_labels,
    );
    let policy = ImageFailurePolicy::resolve(args.on_image_failure, parser.format());

    info!("Starting the conversion process...");
    match process_dataset(&parser, policy, &args.output_dir) {
        Ok(DatasetOutcome::Written { path, rows }) => {
            info!("Conversion completed: {} rows written to {}", rows, path.display())
        }
        Ok(DatasetOutcome::NoData) => {}
        Err(e) => error!("Failed to write dataset: {}", e),
    }
}
