use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use tf_core::{CrowdLevel, EncoderId, ForecastError, TripRequest};
use tf_forecast::TripForecaster;
use tf_predictors::{
    DecisionTree, DualModelPredictor, EncoderSet, LabelEncoder, LinearModel, ModelArtifact,
    TreeEnsemble, TreeNode,
};

fn encoder(id: EncoderId, classes: &[&str]) -> LabelEncoder {
    LabelEncoder::from_classes(id, classes.iter().map(|c| c.to_string()).collect()).unwrap()
}

fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> DecisionTree {
    DecisionTree {
        nodes: vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf(left),
            TreeNode::Leaf(right),
        ],
    }
}

/// Regression: busier on weekends and with a high past crowd.
/// Classification (crowd classes High=0, Low=1, Medium=2): weekends are High,
/// weekdays follow the past crowd reading.
fn encoder_set() -> EncoderSet {
    EncoderSet::new(
        encoder(EncoderId::Place, &["Golden Temple", "Tirupati", "Vatican City"]),
        encoder(EncoderId::Country, &["India", "Italy"]),
        encoder(EncoderId::Holiday, &["No", "Yes"]),
        encoder(EncoderId::CrowdLevel, &["High", "Low", "Medium"]),
    )
    .unwrap()
}

fn forecaster() -> TripForecaster {
    let regression = ModelArtifact::TreeEnsemble(TreeEnsemble {
        trees: vec![stump(5, 0.5, 2_000.0, 9_000.0), stump(0, 400.0, 1_000.0, 4_000.0)],
    });
    let classification = ModelArtifact::TreeEnsemble(TreeEnsemble {
        trees: vec![
            stump(5, 0.5, 1.0, 0.0),
            stump(5, 0.5, 2.0, 0.0),
            stump(0, 400.0, 1.0, 2.0),
        ],
    });
    regression.validate().unwrap();
    classification.validate().unwrap();

    let predictor = DualModelPredictor::new(Arc::new(regression), Arc::new(classification));
    TripForecaster::new(Arc::new(predictor), Arc::new(encoder_set()))
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn golden_temple(start: NaiveDate, end: NaiveDate) -> TripRequest {
    TripRequest {
        place: "Golden Temple".into(),
        country: "India".into(),
        public_holiday: false,
        past_crowd_level: 500,
        start_date: start,
        end_date: end,
    }
}

#[test]
fn golden_temple_three_days() {
    let seq = forecaster()
        .forecast(&golden_temple(ymd(2024, 1, 1), ymd(2024, 1, 3)))
        .unwrap();
    let dates: Vec<_> = seq.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 2), ymd(2024, 1, 3)]);
    for day in &seq {
        // weekday, past crowd above 400: (2000 + 4000) / 2 visitors, votes Low/Medium/Medium
        assert_eq!(day.visitor_count, 3_000);
        assert_eq!(day.crowd_level, CrowdLevel::Medium);
        assert_eq!(day.advisory_tier.as_str(), "Medium");
    }
}

#[test]
fn weekend_turns_high() {
    let seq = forecaster()
        .forecast(&golden_temple(ymd(2024, 1, 6), ymd(2024, 1, 7)))
        .unwrap();
    assert!(seq.iter().all(|d| d.crowd_level == CrowdLevel::High));
    assert!(seq.iter().all(|d| d.visitor_count == 6_500));
    assert_eq!(
        seq.days()[0].recommendation,
        "Heavy crowding; prefer early-morning or weekday visits."
    );
}

#[test]
fn single_day_request() {
    let day = ymd(2024, 2, 29);
    let seq = forecaster().forecast(&golden_temple(day, day)).unwrap();
    assert_eq!(seq.len(), 1);
    assert_eq!(seq.first_date(), Some(day));
}

#[test]
fn unseen_pair_is_rejected_without_output() {
    let mut req = golden_temple(ymd(2024, 1, 1), ymd(2024, 1, 3));
    req.place = "Mecca".into();
    req.country = "Saudi Arabia".into();
    let result = forecaster().forecast(&req);
    assert!(matches!(
        result,
        Err(ForecastError::UnknownCategory { encoder: EncoderId::Place, .. })
    ));
}

#[test]
fn out_of_range_past_crowd_is_forwarded() {
    let mut req = golden_temple(ymd(2024, 1, 1), ymd(2024, 1, 1));
    req.past_crowd_level = -5_000;
    let seq = forecaster().forecast(&req).unwrap();
    // weekday, past crowd at or below 400: (2000 + 1000) / 2, votes Low/Medium/Low
    assert_eq!(seq.days()[0].visitor_count, 1_500);
    assert_eq!(seq.days()[0].crowd_level, CrowdLevel::Low);
}

#[test]
fn overflowing_visitor_estimate_fails_the_request() {
    let mut weights = vec![0.0; 8];
    weights[0] = 1e300;
    let regression = ModelArtifact::Linear(LinearModel {
        weights,
        intercept: 0.0,
    });
    let classification = ModelArtifact::Linear(LinearModel {
        weights: vec![0.0; 8],
        intercept: 1.0,
    });
    regression.validate().unwrap();
    let predictor = DualModelPredictor::new(Arc::new(regression), Arc::new(classification));
    let forecaster = TripForecaster::new(Arc::new(predictor), Arc::new(encoder_set()));

    let mut req = golden_temple(ymd(2024, 1, 1), ymd(2024, 1, 2));
    req.past_crowd_level = 10_000_000_000;
    let result = forecaster.forecast(&req);
    assert!(matches!(result, Err(ForecastError::Inference(_))), "got {result:?}");
}

#[test]
fn forecaster_is_shareable_across_threads() {
    let forecaster = forecaster();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let f = forecaster.clone();
            std::thread::spawn(move || {
                let start = ymd(2024, 1, 1) + Duration::days(i);
                f.forecast(&golden_temple(start, start + Duration::days(10)))
                    .map(|seq| seq.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 11);
    }
}

proptest! {
    #[test]
    fn sequence_covers_range_in_order(
        start_offset in 0i64..4_000,
        span in 0i64..120,
        past in -100i64..5_000,
        holiday in any::<bool>(),
    ) {
        let start = ymd(2015, 1, 1) + Duration::days(start_offset);
        let end = start + Duration::days(span);
        let mut req = golden_temple(start, end);
        req.past_crowd_level = past;
        req.public_holiday = holiday;

        let f = forecaster();
        let seq = f.forecast(&req).unwrap();
        prop_assert_eq!(seq.len() as i64, span + 1);
        prop_assert_eq!(seq.first_date(), Some(start));
        prop_assert_eq!(seq.last_date(), Some(end));
        for pair in seq.days().windows(2) {
            prop_assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }

        let again = f.forecast(&req).unwrap();
        prop_assert_eq!(seq, again);
    }
}
