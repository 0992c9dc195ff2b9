use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::DelayError;

/// Known carriers. Any other operator name is rejected before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Airline {
    #[serde(rename = "American Airlines")]
    AmericanAirlines,
    #[serde(rename = "Air Canada")]
    AirCanada,
    #[serde(rename = "Air France")]
    AirFrance,
    #[serde(rename = "Aeromexico")]
    Aeromexico,
    #[serde(rename = "Aerolineas Argentinas")]
    AerolineasArgentinas,
    #[serde(rename = "Austral")]
    Austral,
    #[serde(rename = "Avianca")]
    Avianca,
    #[serde(rename = "Alitalia")]
    Alitalia,
    #[serde(rename = "British Airways")]
    BritishAirways,
    #[serde(rename = "Copa Air")]
    CopaAir,
    #[serde(rename = "Delta Air")]
    DeltaAir,
    #[serde(rename = "Gol Trans")]
    GolTrans,
    #[serde(rename = "Iberia")]
    Iberia,
    #[serde(rename = "K.L.M.")]
    Klm,
    #[serde(rename = "Qantas Airways")]
    QantasAirways,
    #[serde(rename = "United Airlines")]
    UnitedAirlines,
    #[serde(rename = "Grupo LATAM")]
    GrupoLatam,
    #[serde(rename = "Sky Airline")]
    SkyAirline,
    #[serde(rename = "Latin American Wings")]
    LatinAmericanWings,
    #[serde(rename = "Plus Ultra Lineas Aereas")]
    PlusUltraLineasAereas,
    #[serde(rename = "JetSmart SPA")]
    JetSmartSpa,
    #[serde(rename = "Oceanair Linhas Aereas")]
    OceanairLinhasAereas,
    #[serde(rename = "Lacsa")]
    Lacsa,
}

impl Airline {
    pub const ALL: [Airline; 23] = [
        Airline::AmericanAirlines,
        Airline::AirCanada,
        Airline::AirFrance,
        Airline::Aeromexico,
        Airline::AerolineasArgentinas,
        Airline::Austral,
        Airline::Avianca,
        Airline::Alitalia,
        Airline::BritishAirways,
        Airline::CopaAir,
        Airline::DeltaAir,
        Airline::GolTrans,
        Airline::Iberia,
        Airline::Klm,
        Airline::QantasAirways,
        Airline::UnitedAirlines,
        Airline::GrupoLatam,
        Airline::SkyAirline,
        Airline::LatinAmericanWings,
        Airline::PlusUltraLineasAereas,
        Airline::JetSmartSpa,
        Airline::OceanairLinhasAereas,
        Airline::Lacsa,
    ];

    /// Operator name as it appears in the `OPERA` field
    pub fn name(&self) -> &'static str {
        match self {
            Airline::AmericanAirlines => "American Airlines",
            Airline::AirCanada => "Air Canada",
            Airline::AirFrance => "Air France",
            Airline::Aeromexico => "Aeromexico",
            Airline::AerolineasArgentinas => "Aerolineas Argentinas",
            Airline::Austral => "Austral",
            Airline::Avianca => "Avianca",
            Airline::Alitalia => "Alitalia",
            Airline::BritishAirways => "British Airways",
            Airline::CopaAir => "Copa Air",
            Airline::DeltaAir => "Delta Air",
            Airline::GolTrans => "Gol Trans",
            Airline::Iberia => "Iberia",
            Airline::Klm => "K.L.M.",
            Airline::QantasAirways => "Qantas Airways",
            Airline::UnitedAirlines => "United Airlines",
            Airline::GrupoLatam => "Grupo LATAM",
            Airline::SkyAirline => "Sky Airline",
            Airline::LatinAmericanWings => "Latin American Wings",
            Airline::PlusUltraLineasAereas => "Plus Ultra Lineas Aereas",
            Airline::JetSmartSpa => "JetSmart SPA",
            Airline::OceanairLinhasAereas => "Oceanair Linhas Aereas",
            Airline::Lacsa => "Lacsa",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Airline::ALL.iter().copied().find(|a| a.name() == name)
    }
}

impl fmt::Display for Airline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `TIPOVUELO`: national or international flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlightType {
    #[serde(rename = "N")]
    National,
    #[serde(rename = "I")]
    International,
}

impl FlightType {
    pub const ALL: [FlightType; 2] = [FlightType::National, FlightType::International];

    pub fn code(&self) -> &'static str {
        match self {
            FlightType::National => "N",
            FlightType::International => "I",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(FlightType::National),
            "I" => Some(FlightType::International),
            _ => None,
        }
    }
}

impl fmt::Display for FlightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Calendar month, always within 1..=12
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Month(u8);

impl Month {
    pub const MIN: i64 = 1;
    pub const MAX: i64 = 12;

    pub fn new(value: i64) -> Result<Self, DelayError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Month(value as u8))
        } else {
            Err(DelayError::InvalidMonth(value))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Month {
    type Error = DelayError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Month::new(value)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> u8 {
        month.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One raw flight as seen at inference time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "OPERA")]
    pub airline: Airline,
    #[serde(rename = "TIPOVUELO")]
    pub flight_type: FlightType,
    #[serde(rename = "MES")]
    pub month: Month,
}

impl FlightRecord {
    pub fn new(airline: Airline, flight_type: FlightType, month: Month) -> Self {
        FlightRecord {
            airline,
            flight_type,
            month,
        }
    }
}

/// A historical flight with its scheduled (`Fecha-I`) and observed (`Fecha-O`) times
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub flight: FlightRecord,
    pub scheduled: NaiveDateTime,
    pub observed: NaiveDateTime,
}

/// Body of `POST /predict` after validation
#[derive(Debug, Clone, PartialEq)]
pub struct FlightsRequest {
    pub flights: Vec<FlightRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predict: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
