// ==========================================
// 训练流水线集成测试
// ==========================================
// 测试目标: 合成数据 → 训练 → 评估 → 保存 → 加载
// ==========================================

mod test_helpers;

use hospital_advisory::engine::{ForestParams, LoadPredictor, ModelError};
use hospital_advisory::training::{SyntheticDataGenerator, TrainingPipeline, DEFAULT_HOLDOUT_DAYS};
use test_helpers::{build_daily_series, date};

fn fast_pipeline() -> TrainingPipeline {
    TrainingPipeline::new(
        ForestParams {
            n_estimators: 12,
            ..ForestParams::default()
        },
        DEFAULT_HOLDOUT_DAYS,
    )
}

#[test]
fn test_train_on_synthetic_year() {
    let records = SyntheticDataGenerator::default_year()
        .unwrap()
        .generate()
        .unwrap()
        .daily_records();
    assert_eq!(records.len(), 366);

    let report = fast_pipeline().run(records).expect("training succeeds");

    // 366 天 - 前 7 天无滞后 - 60 天留出
    assert_eq!(report.metrics.train_size, 299);
    assert_eq!(report.metrics.test_size, 60);
    assert!(report.metrics.mae > 0.0);
    assert!(report.metrics.mae <= report.metrics.rmse);

    assert_eq!(report.top_features.len(), 5);
    for pair in report.top_features.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }

    assert_eq!(report.artifact.training_end_date, Some(date(2024, 12, 31)));
    assert_eq!(report.artifact.forest.n_trees(), 12);
}

#[test]
fn test_report_save_and_serve() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("patient_predictor.json");

    let records = build_daily_series(date(2024, 1, 1), 120);
    let report = fast_pipeline().run(records).unwrap();
    report.save(&path).unwrap();

    let predictor = LoadPredictor::load(&path);
    assert!(predictor.is_trained());
    let metadata = predictor.metadata().unwrap();
    assert_eq!(metadata.model_id, report.artifact.model_id);
    assert_eq!(metadata.metrics, Some(report.metrics));
    assert_eq!(metadata.training_end_date, Some(date(2024, 4, 29)));
}

#[test]
fn test_insufficient_rows_rejected() {
    // 67 天 → 60 行训练样本，不多于留出天数
    let records = build_daily_series(date(2024, 1, 1), 67);
    let err = fast_pipeline().run(records).unwrap_err();
    assert!(matches!(
        err,
        ModelError::InsufficientTrainingData { required: 60, actual: 60 }
    ));
}

#[test]
fn test_unsorted_input_is_sorted_before_training() {
    let mut records = build_daily_series(date(2024, 1, 1), 100);
    records.reverse();
    let report = fast_pipeline().run(records).unwrap();
    assert_eq!(report.artifact.training_end_date, Some(date(2024, 4, 9)));
    assert_eq!(report.metrics.train_size, 33);
}
