use std::{
    collections::BTreeSet,
    ops::{Deref, DerefMut},
};

use serde::{Deserialize, Serialize};

use crate::{json_column, validation::FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
    FullBody,
}

/// What a set of an exercise records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoggingType {
    RepsWeight,
    Reps,
    Time,
    Distance,
}

/// A single measurement a set can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    WeightG,
    Reps,
    Seconds,
    DistanceM,
}

impl Metric {
    /// Field name in the JSON body
    pub const fn field(&self) -> &'static str {
        match self {
            Metric::WeightG => "weightG",
            Metric::Reps => "reps",
            Metric::Seconds => "seconds",
            Metric::DistanceM => "distanceM",
        }
    }
}

impl LoggingType {
    pub const fn metrics(&self) -> &'static [Metric] {
        match self {
            LoggingType::RepsWeight => &[Metric::Reps, Metric::WeightG],
            LoggingType::Reps => &[Metric::Reps],
            LoggingType::Time => &[Metric::Seconds],
            LoggingType::Distance => &[Metric::DistanceM],
        }
    }
}

macro_rules! set_newtype {
    ($name:ident, $item:ty) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub BTreeSet<$item>);

        impl Deref for $name {
            type Target = BTreeSet<$item>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl<const N: usize> From<[$item; N]> for $name {
            fn from(items: [$item; N]) -> Self {
                Self(BTreeSet::from(items))
            }
        }

        impl FromIterator<$item> for $name {
            fn from_iter<I: IntoIterator<Item = $item>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }

        impl<'a> From<&'a $name> for FieldValue<'a> {
            fn from(value: &'a $name) -> Self {
                FieldValue::Count(value.len())
            }
        }

        json_column!($name);
    };
}

set_newtype!(MuscleGroups, MuscleGroup);
set_newtype!(LoggingTypes, LoggingType);
