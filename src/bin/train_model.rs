// 离线训练工具：生成（或导入）历史数据，训练随机森林并保存模型产物。
//
// Usage:
//   cargo run --bin train_model -- [--output path.json] [--input daily.csv|xlsx]
//                                  [--external external_factors.csv --visits patient_visits.csv]
//                                  [--data-dir dir] [--trees n] [--seed n]
//
// 未指定数据源时使用 2024 全年的合成数据（seed 42）。

use hospital_advisory::config::default_model_path;
use hospital_advisory::engine::ForestParams;
use hospital_advisory::importer::{
    export_daily_series, export_external_factors, export_hourly_visits, HistoryImporter,
};
use hospital_advisory::logging;
use hospital_advisory::training::{DailyRecord, SyntheticDataGenerator, TrainingPipeline};
use std::path::PathBuf;

#[derive(Debug, Default)]
struct Options {
    output: Option<PathBuf>,
    input: Option<PathBuf>,
    external: Option<PathBuf>,
    visits: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    trees: Option<usize>,
    seed: Option<u64>,
}

fn parse_args() -> Result<Options, Box<dyn std::error::Error>> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);

    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| format!("参数 {} 缺少取值", flag))
        };
        match flag.as_str() {
            "--output" => opts.output = Some(PathBuf::from(value()?)),
            "--input" => opts.input = Some(PathBuf::from(value()?)),
            "--external" => opts.external = Some(PathBuf::from(value()?)),
            "--visits" => opts.visits = Some(PathBuf::from(value()?)),
            "--data-dir" => opts.data_dir = Some(PathBuf::from(value()?)),
            "--trees" => opts.trees = Some(value()?.parse()?),
            "--seed" => opts.seed = Some(value()?.parse()?),
            other => return Err(format!("未知参数: {}", other).into()),
        }
    }

    if opts.external.is_some() != opts.visits.is_some() {
        return Err("--external 与 --visits 必须同时指定".into());
    }
    Ok(opts)
}

fn load_records(opts: &Options) -> Result<Vec<DailyRecord>, Box<dyn std::error::Error>> {
    let importer = HistoryImporter::new();

    if let Some(input) = &opts.input {
        tracing::info!(path = %input.display(), "导入日序列");
        return Ok(importer.import_daily_series(input)?);
    }

    if let (Some(external), Some(visits)) = (&opts.external, &opts.visits) {
        tracing::info!(external = %external.display(), visits = %visits.display(), "导入外部因子与逐时就诊数据");
        return Ok(importer.import_split_sources(external, visits)?);
    }

    tracing::info!("未指定数据源，生成合成数据");
    let dataset = SyntheticDataGenerator::default_year()?.generate()?;

    if let Some(dir) = &opts.data_dir {
        std::fs::create_dir_all(dir)?;
        export_external_factors(dir.join("external_factors.csv"), &dataset.external)?;
        export_hourly_visits(dir.join("patient_visits.csv"), &dataset.visits)?;
        export_daily_series(dir.join("daily_series.csv"), &dataset.daily_records())?;
        tracing::info!(dir = %dir.display(), "合成数据已导出");
    }

    Ok(dataset.daily_records())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let opts = parse_args()?;
    let records = load_records(&opts)?;

    let mut params = ForestParams::default();
    if let Some(trees) = opts.trees {
        params.n_estimators = trees;
    }
    if let Some(seed) = opts.seed {
        params.seed = seed;
    }

    let pipeline = TrainingPipeline::new(params, hospital_advisory::training::DEFAULT_HOLDOUT_DAYS);
    let report = pipeline.run(records)?;

    let output = opts.output.clone().unwrap_or_else(default_model_path);
    report.save(&output)?;

    println!("model_id={}", report.artifact.model_id);
    println!("mae={:.2}", report.metrics.mae);
    println!("rmse={:.2}", report.metrics.rmse);
    for (name, importance) in &report.top_features {
        println!("importance {}={:.4}", name, importance);
    }
    println!("saved={}", output.display());
    Ok(())
}
