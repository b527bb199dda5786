use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::planner::MealCount;
use crate::validation::{clamp_age, clamp_height_cm, clamp_target_calories, clamp_weight_kg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Low,
    #[default]
    Moderate,
    High,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::High => 1.725,
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}', expected male or female", other)),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ActivityLevel::Low),
            "moderate" => Ok(ActivityLevel::Moderate),
            "high" => Ok(ActivityLevel::High),
            other => Err(format!("unknown activity level '{}', expected low, moderate or high", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub number_of_meals: MealCount,
    pub target_calories: u32,
    pub weight_kg: f64,
    pub height_cm: u32,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    /// Use the BMR-derived target instead of `target_calories`.
    pub use_calculated_calories: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            number_of_meals: MealCount::Five,
            target_calories: 2000,
            weight_kg: 70.0,
            height_cm: 170,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
            use_calculated_calories: false,
        }
    }
}

impl UserSettings {
    pub fn bmi(&self) -> f64 {
        let height_m = f64::from(self.height_cm) / 100.0;
        if height_m <= 0.0 {
            return 0.0;
        }
        self.weight_kg / height_m.powi(2)
    }

    pub fn bmi_category(&self) -> BmiCategory {
        let bmi = self.bmi();
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    /// Harris-Benedict BMR times the activity multiplier, truncated.
    pub fn calculated_calories(&self) -> u32 {
        let weight = self.weight_kg;
        let height = f64::from(self.height_cm);
        let age = f64::from(self.age);
        let bmr = match self.gender {
            Gender::Male => 88.362 + 13.397 * weight + 4.799 * height - 5.677 * age,
            Gender::Female => 447.593 + 9.247 * weight + 3.098 * height - 4.330 * age,
        };
        (bmr * self.activity_level.multiplier()).max(0.0) as u32
    }

    pub fn effective_target_calories(&self) -> u32 {
        if self.use_calculated_calories {
            self.calculated_calories()
        } else {
            self.target_calories
        }
    }

    /// Pulls every numeric field into its valid range.
    pub fn clamped(&self) -> Self {
        let weight_kg = if self.weight_kg.is_finite() { clamp_weight_kg(self.weight_kg) } else { 70.0 };
        Self {
            target_calories: clamp_target_calories(self.target_calories),
            weight_kg,
            height_cm: clamp_height_cm(self.height_cm),
            age: clamp_age(self.age),
            ..self.clone()
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: io::Error },
    Serialization(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io { path, source } => {
                write!(f, "settings file error at {}: {}", path.display(), source)
            }
            SettingsError::Serialization(err) => write!(f, "settings serialization error: {}", err),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsError::Io { source, .. } => Some(source),
            SettingsError::Serialization(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Serialization(err)
    }
}

/// Persisted user settings plus a change feed. Share it behind an `Arc`;
/// every successful save is published to all subscribers.
#[derive(Debug)]
pub struct SettingsRepository {
    path: Option<PathBuf>,
    sender: watch::Sender<UserSettings>,
}

impl SettingsRepository {
    /// Settings that live only for this process.
    pub fn in_memory(initial: UserSettings) -> Self {
        let (sender, _) = watch::channel(initial.clamped());
        Self { path: None, sender }
    }

    /// Reads `path` if it exists, falling back to defaults when it does not.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref().to_path_buf();
        let settings = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<UserSettings>(&content)?.clamped(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file yet, using defaults");
                UserSettings::default()
            }
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        let (sender, _) = watch::channel(settings);
        Ok(Self { path: Some(path), sender })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_settings(&self) -> UserSettings {
        self.sender.borrow().clone()
    }

    /// Validates, persists, then notifies subscribers. Nothing is published
    /// if writing the file fails.
    pub fn save_settings(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        let settings = settings.clamped();
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&settings)?;
            fs::write(path, json).map_err(|source| SettingsError::Io { path: path.clone(), source })?;
        }
        info!(
            meals = %settings.number_of_meals,
            target_calories = settings.effective_target_calories(),
            "settings saved"
        );
        self.sender.send_replace(settings);
        Ok(())
    }

    /// The receiver starts with the current value marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<UserSettings> {
        self.sender.subscribe()
    }
}
