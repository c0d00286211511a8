// Unit tests for Kindred Match

use chrono::Utc;
use kindred_match::core::{
    check_eligibility, cosine_similarity, distance_km, haversine_distance, is_eligible,
    to_score, Rejection,
};
use kindred_match::models::{
    Embedding, GenderPreference, Match, MatchAction, MatchStatus, Preferences, Profile,
};
use kindred_match::MatchError;

fn create_test_profile(id: &str, age: u8, gender: &str, wants: &[&str]) -> Profile {
    Profile {
        user_id: id.to_string(),
        bio: format!("Bio of {}", id),
        age,
        gender: gender.to_string(),
        location: "Amsterdam".to_string(),
        latitude: Some(52.3676),
        longitude: Some(4.9041),
        preferences: Preferences {
            age_min: 18,
            age_max: 60,
            max_distance: 25.0,
            gender_preference: GenderPreference::try_from(
                wants.iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            )
            .unwrap(),
            dealbreakers: vec![],
        },
        analysis: None,
        embedding: None,
        photo_urls: vec![],
        is_complete: true,
        is_active: true,
        updated_at: Utc::now(),
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_manhattan_to_brooklyn() {
    let distance = haversine_distance(40.7580, -73.9855, 40.6782, -73.9442);
    assert!(distance > 5.0 && distance < 15.0);
}

#[test]
fn test_distance_is_symmetric() {
    let points = [
        (51.5074, -0.1278),
        (48.8566, 2.3522),
        (-33.8688, 151.2093),
        (35.6762, 139.6503),
    ];
    for &a in &points {
        for &b in &points {
            let ab = distance_km(Some(a), Some(b)).unwrap();
            let ba = distance_km(Some(b), Some(a)).unwrap();
            assert!((ab - ba).abs() < 1e-9);
            assert!(ab >= 0.0);
        }
    }
}

#[test]
fn test_distance_unknown_for_bad_coordinates() {
    assert_eq!(distance_km(None, Some((0.0, 0.0))), None);
    assert_eq!(distance_km(Some((f64::NAN, 0.0)), Some((0.0, 0.0))), None);
    assert_eq!(distance_km(Some((91.0, 0.0)), Some((0.0, 0.0))), None);
}

#[test]
fn test_cosine_bounds_and_symmetry() {
    let vectors: Vec<Vec<f32>> = vec![
        vec![1.0, 2.0, 3.0],
        vec![-1.0, 0.5, 0.0],
        vec![0.3, -0.3, 0.9],
        vec![10.0, 10.0, -10.0],
    ];
    for a in &vectors {
        for b in &vectors {
            let ab = cosine_similarity(a, b).unwrap();
            let ba = cosine_similarity(b, a).unwrap();
            assert!((-1.0..=1.0).contains(&ab));
            assert!((ab - ba).abs() < 1e-12);
        }
    }
}

#[test]
fn test_orthogonal_vectors_score_fifty() {
    let s = cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).unwrap();
    assert_eq!(to_score(s), 50);
}

#[test]
fn test_dimension_mismatch() {
    let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
    assert!(matches!(err, MatchError::DimensionMismatch { left: 2, right: 3 }));
}

#[test]
fn test_score_is_monotonic() {
    let mut previous = 0;
    for step in 0..=200 {
        let s = -1.0 + step as f64 * 0.01;
        let score = to_score(s);
        assert!(score >= previous);
        assert!(score <= 100);
        previous = score;
    }
}

#[test]
fn test_eligibility_is_symmetric() {
    let profiles = vec![
        create_test_profile("a", 25, "female", &["male"]),
        create_test_profile("b", 30, "male", &["female"]),
        create_test_profile("c", 45, "male", &["any"]),
        create_test_profile("d", 22, "nonbinary", &["female", "nonbinary"]),
    ];
    for a in &profiles {
        for b in &profiles {
            assert_eq!(is_eligible(a, b), is_eligible(b, a), "{} vs {}", a.user_id, b.user_id);
        }
    }
}

#[test]
fn test_reference_pair_is_eligible() {
    let mut requester = create_test_profile("r", 30, "male", &["female"]);
    requester.preferences.age_min = 25;
    requester.preferences.age_max = 40;
    let mut candidate = create_test_profile("c", 28, "female", &["any"]);
    candidate.preferences.age_min = 20;
    candidate.preferences.age_max = 35;

    assert!(check_eligibility(&requester, &candidate).is_ok());
    assert!(check_eligibility(&candidate, &requester).is_ok());
}

#[test]
fn test_age_checked_before_gender() {
    let mut requester = create_test_profile("r", 30, "male", &["female"]);
    requester.preferences.age_max = 25;
    let candidate = create_test_profile("c", 40, "male", &["male"]);

    assert_eq!(check_eligibility(&requester, &candidate), Err(Rejection::Age));
}

#[test]
fn test_distance_limit_is_mutual() {
    let requester = create_test_profile("r", 30, "male", &["any"]);
    let mut candidate = create_test_profile("c", 30, "female", &["any"]);
    // Haarlem, roughly 18 km away
    candidate.latitude = Some(52.3874);
    candidate.longitude = Some(4.6462);
    assert!(is_eligible(&requester, &candidate));

    candidate.preferences.max_distance = 10.0;
    assert_eq!(check_eligibility(&requester, &candidate), Err(Rejection::Distance));
}

#[test]
fn test_embedding_wire_roundtrip_keeps_length() {
    let original = Embedding::fit(vec![0.25, -1.5, 3.0], 6);
    let parsed = Embedding::parse_wire(&original.to_wire(), 6).unwrap();
    assert_eq!(parsed, original);

    let truncated = Embedding::parse_wire("[1,2,3,4,5,6,7,8]", 6).unwrap();
    assert_eq!(truncated.len(), 6);
}

#[test]
fn test_status_only_moves_forward() {
    let mut m = Match::pending("a", "b", 70, String::new());
    m.apply(MatchAction::Like, "a").unwrap();
    assert_eq!(m.status, MatchStatus::Liked);
    assert!(m.apply(MatchAction::Like, "b").unwrap());
    assert_eq!(m.status, MatchStatus::Mutual);

    assert!(m.apply(MatchAction::Pass, "a").is_err());
    assert!(m.apply(MatchAction::Like, "a").is_err());
    assert_eq!(m.status, MatchStatus::Mutual);
}
