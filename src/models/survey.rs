use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Likert bounds shared by every questionnaire.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// A named group of questionnaire items that is averaged together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pub key: &'static str,
    pub label: &'static str,
    pub items: Range<usize>,
}

const fn scale(key: &'static str, label: &'static str, start: usize, end: usize) -> Scale {
    Scale {
        key,
        label,
        items: start..end,
    }
}

const PREVENTION_SCALES: &[Scale] = &[
    scale("self_control", "Self control", 0, 4),
    scale("stress_coping", "Stress coping", 4, 8),
    scale("relationships", "Relationships", 8, 12),
];

const HEALING_SCALES: &[Scale] = &[
    scale("mood", "Mood", 0, 5),
    scale("stress_relief", "Stress relief", 5, 10),
    scale("vitality", "Vitality", 10, 15),
];

const COUNSELING_SCALES: &[Scale] = &[
    scale("self_esteem", "Self esteem", 0, 5),
    scale("emotional_stability", "Emotional stability", 5, 10),
];

const FACILITY_SCALES: &[Scale] = &[
    scale("lodging", "Lodging", 0, 2),
    scale("meals", "Meals", 2, 4),
    scale("facilities", "Facilities", 4, 6),
    scale("staff", "Staff", 6, 8),
    scale("overall", "Overall", 8, 10),
];

const PROGRAM_SCALES: &[Scale] = &[
    scale("instructor", "Instructor", 0, 2),
    scale("content", "Content", 2, 4),
    scale("effectiveness", "Effectiveness", 4, 6),
];

labeled_enum! {
    /// Questionnaire families collected from participants.
    pub enum SurveyKind ("survey kind") {
        Prevention => "prevention", "Prevention effectiveness";
        Healing => "healing", "Healing effectiveness";
        Counseling => "counseling", "Counseling effectiveness";
        Facility => "facility", "Facility satisfaction";
        Program => "program", "Program satisfaction";
    }
}

impl SurveyKind {
    /// Kinds measured before and after the stay.
    pub const EFFECTIVENESS: &'static [SurveyKind] = &[
        SurveyKind::Prevention,
        SurveyKind::Healing,
        SurveyKind::Counseling,
    ];

    pub fn scales(&self) -> &'static [Scale] {
        match self {
            SurveyKind::Prevention => PREVENTION_SCALES,
            SurveyKind::Healing => HEALING_SCALES,
            SurveyKind::Counseling => COUNSELING_SCALES,
            SurveyKind::Facility => FACILITY_SCALES,
            SurveyKind::Program => PROGRAM_SCALES,
        }
    }

    pub fn item_count(&self) -> usize {
        self.scales().iter().map(|s| s.items.end).max().unwrap_or(0)
    }

    pub fn is_effectiveness(&self) -> bool {
        Self::EFFECTIVENESS.contains(self)
    }

    /// Effectiveness surveys are taken pre and post; satisfaction surveys once.
    pub fn accepts_phase(&self, phase: SurveyPhase) -> bool {
        if self.is_effectiveness() {
            matches!(phase, SurveyPhase::Pre | SurveyPhase::Post)
        } else {
            phase == SurveyPhase::Single
        }
    }
}

labeled_enum! {
    pub enum SurveyPhase ("survey phase") {
        Pre => "pre", "Pre";
        Post => "post", "Post";
        Single => "single", "Single";
    }
}

labeled_enum! {
    /// Heart-rate-variability readings taken with the biofeedback device.
    pub enum HrvMetric ("hrv metric") {
        AutonomicActivity => "autonomic_activity", "Autonomic activity";
        AutonomicBalance => "autonomic_balance", "Autonomic balance";
        StressResistance => "stress_resistance", "Stress resistance";
        StressIndex => "stress_index", "Stress index";
        Fatigue => "fatigue", "Fatigue";
        HeartRate => "heart_rate", "Heart rate";
    }
}
