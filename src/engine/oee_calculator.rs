// ==========================================
// OEE 监控系统 - OEE 指标计算引擎
// ==========================================
// 职责: 生产区间原始计数 → 可用率 / 性能率 / 质量率 / OEE
// 红线: 纯函数, 不依赖存储生命周期; 只钳制输出, 不钳制输入
// ==========================================
// 公式:
//   availability = (planned - downtime) / planned * 100
//   expected     = target_rate * planned * derating
//   performance  = good / (expected * runtime / planned) * 100, 上限 100
//   quality      = good / (good + film + organic) * 100, 无产出时 100
//   oee          = A * P * Q / 10000
// ==========================================

use crate::domain::production::{FieldViolation, OeeMetrics, ProductionInterval};
use crate::domain::types::ZeroPlannedTimePolicy;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// ==========================================
// OeeParameters - 计算参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OeeParameters {
    /// 目标速率缺失时的默认值 (件/分钟)
    pub default_target_rate: f64,
    /// 理论产能折减系数
    pub performance_derating: f64,
    /// 计划时间为 0 时的取值策略
    pub zero_planned_policy: ZeroPlannedTimePolicy,
    /// 有机废料 质量→件数 换算系数 (1.0 = 直接相加)
    pub organic_waste_factor: f64,
}

impl OeeParameters {
    pub const DEFAULT_TARGET_RATE: f64 = 65.0;
    pub const DEFAULT_PERFORMANCE_DERATING: f64 = 0.85;
}

impl Default for OeeParameters {
    fn default() -> Self {
        Self {
            default_target_rate: Self::DEFAULT_TARGET_RATE,
            performance_derating: Self::DEFAULT_PERFORMANCE_DERATING,
            zero_planned_policy: ZeroPlannedTimePolicy::AllZero,
            organic_waste_factor: 1.0,
        }
    }
}

// ==========================================
// OeeCalculator - OEE 计算引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct OeeCalculator {
    params: OeeParameters,
}

impl OeeCalculator {
    pub fn new(params: OeeParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OeeParameters {
        &self.params
    }

    // ==========================================
    // 输入校验
    // ==========================================

    /// 校验生产区间, 一次返回全部字段违规
    pub fn validate(&self, interval: &ProductionInterval) -> Vec<FieldViolation> {
        let mut violations = Vec::new();

        if interval.machine_id.trim().is_empty() {
            violations.push(FieldViolation::new("machine_id", "机组标识不能为空"));
        }

        let counters = [
            ("good_production", interval.good_production),
            ("film_waste", interval.film_waste),
            ("organic_waste", interval.organic_waste),
            ("planned_time", interval.planned_time),
            ("downtime_minutes", interval.downtime_minutes),
        ];
        for (field, value) in counters {
            if !value.is_finite() {
                violations.push(FieldViolation::new(field, "必须为有效数值"));
            } else if value < 0.0 {
                violations.push(FieldViolation::new(field, format!("不能为负数: {}", value)));
            }
        }

        // 停机时间不得超过计划时间
        if interval.downtime_minutes.is_finite()
            && interval.planned_time.is_finite()
            && interval.downtime_minutes > interval.planned_time
            && interval.planned_time > 0.0
        {
            violations.push(FieldViolation::new(
                "downtime_minutes",
                format!(
                    "停机时间 {} 分钟超过计划时间 {} 分钟",
                    interval.downtime_minutes, interval.planned_time
                ),
            ));
        }

        if let Some(rate) = interval.target_rate_per_minute {
            if !rate.is_finite() || rate < 0.0 {
                violations.push(FieldViolation::new(
                    "target_rate_per_minute",
                    format!("目标速率非法: {}", rate),
                ));
            }
        }

        if let Some(end) = interval.end_time {
            if end < interval.start_time {
                violations.push(FieldViolation::new("end_time", "结束时间早于开始时间"));
            }
        }

        violations
    }

    // ==========================================
    // 指标计算
    // ==========================================

    /// 计算 OEE 指标
    ///
    /// # 返回
    /// - Ok(OeeMetrics): 四项指标, 均在 [0,100]
    /// - Err(Validation): 输入非法, 不返回部分结果
    pub fn compute(&self, interval: &ProductionInterval) -> EngineResult<OeeMetrics> {
        let violations = self.validate(interval);
        if !violations.is_empty() {
            return Err(EngineError::Validation { violations });
        }

        let planned = interval.planned_time;
        if planned <= 0.0 {
            return Ok(match self.params.zero_planned_policy {
                ZeroPlannedTimePolicy::AllZero => OeeMetrics::zero(),
                ZeroPlannedTimePolicy::FullQuality => OeeMetrics {
                    quality: 100.0,
                    ..OeeMetrics::zero()
                },
            });
        }

        let downtime = interval.downtime_minutes;
        let good = interval.good_production;

        // 1. 可用率
        let availability = clamp_pct((planned - downtime) / planned * 100.0);

        // 2. 性能率
        let target_rate = self.effective_target_rate(interval);
        let actual_runtime = (planned - downtime).max(0.0);
        let expected_production = target_rate * planned * self.params.performance_derating;
        let performance_raw = if expected_production > 0.0 && actual_runtime > 0.0 {
            good / ((expected_production * actual_runtime) / planned) * 100.0
        } else {
            0.0
        };
        let performance = clamp_pct(performance_raw.min(100.0));

        // 3. 质量率
        let total_production = good + interval.total_waste(self.params.organic_waste_factor);
        let quality = if total_production > 0.0 {
            clamp_pct(good / total_production * 100.0)
        } else {
            100.0
        };

        // 4. OEE
        let oee = clamp_pct(availability * performance * quality / 10_000.0);

        Ok(OeeMetrics {
            availability,
            performance,
            quality,
            oee,
        })
    }

    /// 有效目标速率: 区间自带 > 默认值
    pub fn effective_target_rate(&self, interval: &ProductionInterval) -> f64 {
        match interval.target_rate_per_minute {
            Some(rate) => rate,
            None => {
                tracing::debug!(
                    "机组 {} 未提供目标速率, 使用默认值 {}",
                    interval.machine_id,
                    self.params.default_target_rate
                );
                self.params.default_target_rate
            }
        }
    }
}

/// 钳制到 [0,100], 非有限值记 0
fn clamp_pct(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn interval(
        planned: f64,
        downtime: f64,
        good: f64,
        film: f64,
        organic: f64,
        rate: Option<f64>,
    ) -> ProductionInterval {
        ProductionInterval {
            machine_id: "M01".to_string(),
            start_time: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
            end_time: None,
            good_production: good,
            film_waste: film,
            organic_waste: organic,
            planned_time: planned,
            downtime_minutes: downtime,
            target_rate_per_minute: rate,
        }
    }

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_reference_scenario() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(480.0, 60.0, 400.0, 20.0, 10.0, Some(65.0)))
            .unwrap();

        assert!(approx(m.availability, 87.5, 1e-9));
        assert!(approx(m.performance, 400.0 / 23205.0 * 100.0, 1e-9));
        assert!(approx(m.quality, 400.0 / 430.0 * 100.0, 1e-9));
        assert!(approx(m.oee, 1.4031, 1e-3));
        assert!(approx(
            m.oee,
            m.availability * m.performance * m.quality / 10_000.0,
            1e-9
        ));
    }

    #[test]
    fn test_missing_rate_uses_default() {
        let calc = OeeCalculator::default();
        let with_default = calc
            .compute(&interval(480.0, 60.0, 400.0, 20.0, 10.0, None))
            .unwrap();
        let explicit = calc
            .compute(&interval(480.0, 60.0, 400.0, 20.0, 10.0, Some(65.0)))
            .unwrap();
        assert_eq!(with_default, explicit);
    }

    #[test]
    fn test_zero_planned_time_all_zero() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(0.0, 0.0, 100.0, 5.0, 0.0, Some(65.0)))
            .unwrap();
        assert_eq!(m, OeeMetrics::zero());
    }

    #[test]
    fn test_zero_planned_time_full_quality_policy() {
        let calc = OeeCalculator::new(OeeParameters {
            zero_planned_policy: ZeroPlannedTimePolicy::FullQuality,
            ..OeeParameters::default()
        });
        let m = calc
            .compute(&interval(0.0, 0.0, 100.0, 5.0, 0.0, Some(65.0)))
            .unwrap();
        assert_eq!(m.availability, 0.0);
        assert_eq!(m.performance, 0.0);
        assert_eq!(m.quality, 100.0);
        assert_eq!(m.oee, 0.0);
    }

    #[test]
    fn test_performance_capped_at_100() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(60.0, 0.0, 1.0e9, 0.0, 0.0, Some(1.0)))
            .unwrap();
        assert_eq!(m.performance, 100.0);
        assert_eq!(m.availability, 100.0);
        assert_eq!(m.quality, 100.0);
        assert_eq!(m.oee, 100.0);
    }

    #[test]
    fn test_quality_without_output_is_100() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(480.0, 0.0, 0.0, 0.0, 0.0, Some(65.0)))
            .unwrap();
        assert_eq!(m.quality, 100.0);
        assert_eq!(m.performance, 0.0);
        assert_eq!(m.oee, 0.0);
    }

    #[test]
    fn test_full_downtime_gives_zero_performance() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(480.0, 480.0, 10.0, 0.0, 0.0, Some(65.0)))
            .unwrap();
        assert_eq!(m.availability, 0.0);
        assert_eq!(m.performance, 0.0);
        assert_eq!(m.oee, 0.0);
    }

    #[test]
    fn test_zero_target_rate_gives_zero_performance() {
        let calc = OeeCalculator::default();
        let m = calc
            .compute(&interval(480.0, 0.0, 100.0, 0.0, 0.0, Some(0.0)))
            .unwrap();
        assert_eq!(m.performance, 0.0);
    }

    #[test]
    fn test_negative_counters_rejected_with_all_fields() {
        let calc = OeeCalculator::default();
        let err = calc
            .compute(&interval(480.0, 10.0, -1.0, -2.0, 0.0, Some(65.0)))
            .unwrap_err();
        match err {
            EngineError::Validation { violations } => {
                let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["good_production", "film_waste"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_downtime_exceeding_planned_rejected() {
        let calc = OeeCalculator::default();
        let err = calc
            .compute(&interval(60.0, 90.0, 10.0, 0.0, 0.0, Some(65.0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[test]
    fn test_nan_rejected() {
        let calc = OeeCalculator::default();
        assert!(calc
            .compute(&interval(f64::NAN, 0.0, 10.0, 0.0, 0.0, None))
            .is_err());
    }

    #[test]
    fn test_organic_waste_factor_normalises_mass() {
        let calc = OeeCalculator::new(OeeParameters {
            organic_waste_factor: 0.0,
            ..OeeParameters::default()
        });
        let m = calc
            .compute(&interval(480.0, 0.0, 100.0, 0.0, 50.0, Some(65.0)))
            .unwrap();
        assert_eq!(m.quality, 100.0);
    }

    #[test]
    fn test_metrics_always_within_bounds() {
        let calc = OeeCalculator::default();
        let values = [0.0, 0.5, 1.0, 10.0, 59.0, 60.0, 480.0, 1.0e6];
        for &planned in &values {
            for &downtime in &values {
                if downtime > planned {
                    continue;
                }
                for &good in &values {
                    for &waste in &values {
                        let m = calc
                            .compute(&interval(planned, downtime, good, waste, waste, Some(65.0)))
                            .unwrap();
                        assert!(m.is_within_bounds(), "{:?}", m);
                        assert!(approx(
                            m.oee,
                            m.availability * m.performance * m.quality / 10_000.0,
                            1e-9
                        ));
                    }
                }
            }
        }
    }
}
