use std::fmt;

use crate::core::distance::distance_km;
use crate::models::Profile;

/// First hard constraint a pair failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Age,
    Gender,
    Distance,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Age => f.write_str("age"),
            Rejection::Gender => f.write_str("gender"),
            Rejection::Distance => f.write_str("distance"),
        }
    }
}

/// Each party's age is inside the other's [ageMin, ageMax]
#[inline]
pub fn ages_compatible(a: &Profile, b: &Profile) -> bool {
    a.preferences.accepts_age(b.age) && b.preferences.accepts_age(a.age)
}

/// Each party's gender is accepted by the other's preference
#[inline]
pub fn genders_compatible(a: &Profile, b: &Profile) -> bool {
    a.preferences.gender_preference.accepts(&b.gender)
        && b.preferences.gender_preference.accepts(&a.gender)
}

/// Distance is within both parties' maxDistance
///
/// Vacuously true when the distance is unknown (missing or invalid coordinates).
#[inline]
pub fn within_distance(a: &Profile, b: &Profile) -> bool {
    match distance_km(a.coordinates(), b.coordinates()) {
        Some(distance) => {
            distance <= a.preferences.max_distance && distance <= b.preferences.max_distance
        }
        None => true,
    }
}

/// Apply the mutual hard constraints in order, stopping at the first failure
///
/// Pool exclusivity (self, existing matches) is the candidate pool's job,
/// and dealbreakers are never enforced here.
pub fn check_eligibility(requester: &Profile, candidate: &Profile) -> Result<(), Rejection> {
    if !ages_compatible(requester, candidate) {
        return Err(Rejection::Age);
    }
    if !genders_compatible(requester, candidate) {
        return Err(Rejection::Gender);
    }
    if !within_distance(requester, candidate) {
        return Err(Rejection::Distance);
    }
    Ok(())
}

#[inline]
pub fn is_eligible(requester: &Profile, candidate: &Profile) -> bool {
    check_eligibility(requester, candidate).is_ok()
}
