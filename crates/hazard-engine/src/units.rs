//! Averaging-period conversion.

use hazard_common::{AveragingPeriod, HazardError, HazardResult, TerrainCorrection};

use crate::regrid::{AggregatedRow, Conversion};

/// Empirical ratio of 10-minute to 1-minute sustained wind over open water.
pub const ONE_TO_TEN_MINUTE_FACTOR: f64 = 1.0 / 1.05;

/// Convert `1_minute` open-water wind speeds to `10_minutes`.
///
/// Every row is checked before any is modified, so a failure leaves the
/// rows untouched.
pub fn convert_to_ten_minutes(rows: &mut [AggregatedRow]) -> HazardResult<()> {
    for (i, row) in rows.iter().enumerate() {
        let echo = &row.feature.echo;
        if echo.terrain_correction != TerrainCorrection::OpenWater {
            return Err(HazardError::Precondition(format!(
                "row {}: 10_minutes conversion requires terrain_correction=open_water, got {}",
                i, echo.terrain_correction
            )));
        }
        if echo.averaging_period != AveragingPeriod::OneMinute {
            return Err(HazardError::Precondition(format!(
                "row {}: 10_minutes conversion requires wind_speed_averaging_period=1_minute, got {}",
                i, echo.averaging_period
            )));
        }
    }

    for row in rows.iter_mut() {
        if let Some(v) = row.feature.wind_speed.as_mut() {
            *v *= ONE_TO_TEN_MINUTE_FACTOR;
        }
        row.feature.echo.averaging_period = AveragingPeriod::TenMinutes;
        row.conversion = Some(Conversion::OneMinuteToTenMinutes);
    }

    Ok(())
}
