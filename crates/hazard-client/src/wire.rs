//! GeoJSON wire format of point-query responses.

use hazard_common::grid;
use hazard_common::{
    CellBounds, FeatureStatus, HazardFeature, HazardResponse, QueryEcho, ResponseHeader,
    ServiceRequest,
};
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    #[serde(default)]
    header: ResponseHeader,
    #[serde(default)]
    features: Vec<WireFeature>,
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    #[serde(default)]
    geometry: Option<WireGeometry>,
    properties: WireProperties,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    #[serde(rename = "type")]
    type_: String,
    coordinates: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireProperties {
    cell_id: u64,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    status: Option<FeatureStatus>,
    #[serde(default)]
    return_period: Option<u32>,
    #[serde(default)]
    event_id: Option<serde_json::Value>,
    #[serde(default, alias = "name")]
    storm_name: Option<String>,
    #[serde(default, alias = "year", alias = "storm_season")]
    storm_year: Option<i32>,
}

impl WireResponse {
    pub(crate) fn from_slice(body: &[u8]) -> Result<Self, ClientError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Convert to domain types, echoing the request where the header is silent.
    pub(crate) fn into_response(self, request: &ServiceRequest) -> Result<HazardResponse, ClientError> {
        let echo = echo_from_header(&self.header, request)?;

        let features = self
            .features
            .into_iter()
            .map(|f| f.into_feature(&echo))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HazardResponse {
            header: self.header,
            features,
        })
    }
}

impl WireFeature {
    fn into_feature(self, echo: &QueryEcho) -> Result<HazardFeature, ClientError> {
        let props = self.properties;

        let bounds = match self.geometry {
            Some(geometry) => geometry.bounds()?,
            None => grid::cell_bounds(props.cell_id),
        };

        let status = props.status.unwrap_or(if props.wind_speed.is_some() {
            FeatureStatus::Ok
        } else {
            FeatureStatus::NoContent
        });

        let event_id = props.event_id.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

        Ok(HazardFeature {
            cell_id: props.cell_id,
            bounds,
            wind_speed: props.wind_speed,
            status,
            return_period: props.return_period,
            event_id,
            storm_name: props.storm_name,
            storm_year: props.storm_year,
            echo: echo.clone(),
        })
    }
}

impl WireGeometry {
    fn bounds(&self) -> Result<CellBounds, ClientError> {
        if self.type_ != "Polygon" {
            return Err(ClientError::parse(format!(
                "expected Polygon cell geometry, got {}",
                self.type_
            )));
        }

        let rings: Vec<Vec<[f64; 2]>> = serde_json::from_value(self.coordinates.clone())?;
        rings
            .first()
            .and_then(|ring| CellBounds::from_ring(ring))
            .ok_or_else(|| ClientError::parse("empty polygon ring"))
    }
}

fn echo_from_header(header: &ResponseHeader, request: &ServiceRequest) -> Result<QueryEcho, ClientError> {
    let mut echo = QueryEcho::from_request(request);

    if let Some(tc) = &header.terrain_correction {
        echo.terrain_correction = tc
            .parse()
            .map_err(|e| ClientError::parse(format!("header terrain_correction: {}", e)))?;
    }
    if let Some(period) = &header.wind_speed_averaging_period {
        echo.averaging_period = period
            .parse()
            .map_err(|e| ClientError::parse(format!("header wind_speed_averaging_period: {}", e)))?;
    }
    if let Some(scenario) = &header.scenario {
        echo.scenario = scenario.clone();
    }
    if let Some(horizon) = &header.time_horizon {
        echo.time_horizon = horizon.clone();
    }

    Ok(echo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazard_common::{HazardQuery, TerrainCorrection};

    const RETURN_VALUES: &str = r#"{
        "header": {
            "product": "DeepCyc Maps v2.0.6",
            "terrain_correction": "open_water",
            "wind_speed_averaging_period": "1_minute",
            "scenario": "current_climate",
            "time_horizon": "now",
            "simulation_years": 41000,
            "wind_speed_units": "kph"
        },
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [-80.244140625, 25.09765625],
                        [-80.234375, 25.09765625],
                        [-80.234375, 25.107421875],
                        [-80.244140625, 25.107421875],
                        [-80.244140625, 25.09765625]
                    ]]
                },
                "properties": {
                    "cell_id": 396197655,
                    "wind_speed": 212.4,
                    "status": "OK",
                    "return_period": 100
                }
            },
            {
                "type": "Feature",
                "geometry": null,
                "properties": {
                    "cell_id": 396197656,
                    "wind_speed": null,
                    "status": "NO CONTENT",
                    "return_period": 100
                }
            }
        ]
    }"#;

    fn request() -> ServiceRequest {
        HazardQuery {
            terrain_correction: TerrainCorrection::OpenWater,
            averaging_period: hazard_common::AveragingPeriod::OneMinute,
            return_period: Some(100),
            ..Default::default()
        }
        .service_request()
    }

    #[test]
    fn test_parse_return_values() {
        let response = WireResponse::from_slice(RETURN_VALUES.as_bytes())
            .unwrap()
            .into_response(&request())
            .unwrap();

        assert_eq!(response.header.simulation_years, Some(41000));
        assert_eq!(response.features.len(), 2);

        let first = &response.features[0];
        assert_eq!(first.cell_id, 396197655);
        assert_eq!(first.wind_speed, Some(212.4));
        assert_eq!(first.status, FeatureStatus::Ok);
        assert_eq!(first.bounds.lower_left(), (25.09765625, -80.244140625));
        assert_eq!(first.echo.terrain_correction, TerrainCorrection::OpenWater);

        let second = &response.features[1];
        assert_eq!(second.status, FeatureStatus::NoContent);
        assert_eq!(second.bounds, grid::cell_bounds(396197656));
    }

    #[test]
    fn test_parse_event_rows() {
        let body = r#"{
            "header": {"terrain_correction": "full_terrain_gust", "wind_speed_averaging_period": "3_seconds"},
            "features": [
                {"geometry": null, "properties": {"cell_id": 1, "wind_speed": 150.0, "event_id": 42, "name": "ANDREW", "year": 1992}},
                {"geometry": null, "properties": {"cell_id": 1, "wind_speed": 120.0, "event_id": "e-7", "storm_name": "IRMA", "storm_year": 2017}}
            ]
        }"#;
        let response = WireResponse::from_slice(body.as_bytes())
            .unwrap()
            .into_response(&HazardQuery::default().service_request())
            .unwrap();

        assert_eq!(response.features[0].event_id.as_deref(), Some("42"));
        assert_eq!(response.features[0].storm_name.as_deref(), Some("ANDREW"));
        assert_eq!(response.features[0].storm_year, Some(1992));
        assert_eq!(response.features[1].event_id.as_deref(), Some("e-7"));
        assert_eq!(response.features[1].status, FeatureStatus::Ok);
    }

    #[test]
    fn test_non_polygon_geometry_rejected() {
        let body = r#"{"features": [{"geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"cell_id": 1}}]}"#;
        let result = WireResponse::from_slice(body.as_bytes())
            .unwrap()
            .into_response(&HazardQuery::default().service_request());
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_unknown_header_terrain_rejected() {
        let body = r#"{"header": {"terrain_correction": "swamp"}, "features": []}"#;
        let result = WireResponse::from_slice(body.as_bytes())
            .unwrap()
            .into_response(&HazardQuery::default().service_request());
        assert!(result.is_err());
    }
}
