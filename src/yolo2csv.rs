use cards2csv::io::read_class_names;
use cards2csv::{process_dataset, AnnotationParser, DatasetOutcome, ImageFailurePolicy, YoloArgs, YoloParser};
use clap::Parser;
use log::{error, info};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = YoloArgs::parse();

    if !args.dataset.is_dir() {
        error!("The specified dataset does not exist: {}", args.dataset.display());
        return;
    }

    let class_names = match read_class_names(&args.yaml) {
        Ok(names) => names,
        Err(e) => {
            error!("Failed to read class names: {}", e);
            return;
        }
    };
    info!("Loaded {} class names from {}", class_names.len(), args.yaml.display());

    let parser = YoloParser::new(&args.dataset, class_names, args.convert_labels);
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
