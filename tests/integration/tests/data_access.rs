//! Data access integration tests: bearer auth, caching, invalidation,
//! retries and live plot polling.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use merida_api::dto::{CreateFacility, CreateIrrigation, CreatePlot, UpdatePlot, UpdateUser};
use merida_api::queries::keys;
use merida_api::ApiError;

use crate::common::TestEnv;

/// Tests that requests carry the session's token and fail without one.
#[tokio::test]
async fn test_requests_require_a_session() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    env.seed_facility("North greenhouse");

    let anonymous = env.session_manager()?;
    let queries = env.queries(&anonymous)?;
    let result = queries.facilities().await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))), "got {result:?}");
    // Unauthorized is not retried.
    assert_eq!(env.hits("GET /facilities/"), 1);

    let (_manager, queries, _) = env.signed_in().await?;
    let facilities = queries.facilities().await?;
    assert_eq!(facilities.len(), 1);
    assert_eq!(facilities[0].name, "North greenhouse");

    Ok(())
}

/// Tests that logging out stops authorizing requests.
#[tokio::test]
async fn test_logout_revokes_backend_access() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (manager, queries, _) = env.signed_in().await?;
    let facility = env.seed_facility("Field 7");

    queries.facility(&facility).await?;
    manager.logout().await;

    let result = queries.facility(&facility).await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))), "got {result:?}");

    Ok(())
}

/// Tests that cached lists are not served across a change of user.
#[tokio::test]
async fn test_switching_users_clears_cached_lists() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (manager, queries, _) = env.signed_in().await?;
    env.add_user("tech@example.com", "Tech-Pass-1");
    env.seed_facility("North greenhouse");

    queries.facilities().await?;
    queries.facilities().await?;
    assert_eq!(env.hits("GET /facilities/"), 1);

    manager.login("tech@example.com", "Tech-Pass-1", None, None).await?;
    assert_eq!(queries.facilities().await?.len(), 1);
    assert_eq!(env.hits("GET /facilities/"), 2);

    manager.logout().await;
    let result = queries.facilities().await;
    assert!(matches!(result, Err(ApiError::Unauthorized(_))), "got {result:?}");
    assert_eq!(env.hits("GET /facilities/"), 3);

    Ok(())
}

/// Tests that fresh results are served from the cache and mutations
/// invalidate the lists they change.
#[tokio::test]
async fn test_facility_list_cache_and_invalidation() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    env.seed_facility("North greenhouse");

    assert_eq!(queries.facilities().await?.len(), 1);
    assert_eq!(queries.facilities().await?.len(), 1);
    assert_eq!(env.hits("GET /facilities/"), 1);

    let created = queries
        .create_facility(&CreateFacility {
            name: "South field".to_string(),
            location: "Umán".to_string(),
        })
        .await?;
    assert!(!queries.cache().is_fresh(&keys::facilities()));

    let facilities = queries.facilities().await?;
    assert_eq!(env.hits("GET /facilities/"), 2);
    assert!(facilities.iter().any(|f| f.facility_id == created.facility_id));

    queries.delete_facility(&created.facility_id).await?;
    let facilities = queries.facilities().await?;
    assert_eq!(facilities.len(), 1);
    assert_eq!(env.hits("GET /facilities/"), 3);

    Ok(())
}

/// Tests the plot lifecycle through the query layer.
#[tokio::test]
async fn test_plot_mutations_refresh_dependent_queries() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, user_id) = env.signed_in().await?;
    let facility = env.seed_facility("North greenhouse");

    assert!(queries.plots(&user_id).await?.is_empty());
    assert!(queries.facility_plots(&facility).await?.is_empty());

    let created = queries
        .create_plot(&CreatePlot {
            facility_id: facility.clone(),
            name: Some("Bed A".to_string()),
            area: Some(20.0),
            ..CreatePlot::default()
        })
        .await?;

    assert_eq!(queries.plots(&user_id).await?.len(), 1);
    assert_eq!(queries.facility_plots(&facility).await?.len(), 1);
    assert_eq!(env.hits(&format!("GET /users/{user_id}/plots")), 2);

    let plot = queries.plot(&created.plot_id).await?;
    assert_eq!(plot.name.as_deref(), Some("Bed A"));

    queries
        .update_plot(
            &created.plot_id,
            &UpdatePlot {
                name: Some("Bed A1".to_string()),
                ..UpdatePlot::default()
            },
        )
        .await?;
    let plot = queries.plot(&created.plot_id).await?;
    assert_eq!(plot.name.as_deref(), Some("Bed A1"));
    assert_eq!(env.hits(&format!("GET /plot/{}", created.plot_id)), 2);

    queries.delete_plot(&created.plot_id).await?;
    assert!(queries.plots(&user_id).await?.is_empty());
    assert!(queries.facility_plots(&facility).await?.is_empty());
    assert!(matches!(
        queries.plot(&created.plot_id).await,
        Err(ApiError::NotFound(_))
    ));

    Ok(())
}

/// Tests that a server error is retried once and then succeeds.
#[tokio::test]
async fn test_server_error_is_retried_once() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    env.seed_species("Habanero");

    env.fail_next("GET /species/", 503);
    let species = queries.species().await?;
    assert_eq!(species.len(), 1);
    assert_eq!(env.hits("GET /species/"), 2);

    // Two failures in a row exhaust the single retry.
    queries.cache().clear();
    env.fail_next("GET /species/", 500);
    env.fail_next("GET /species/", 500);
    let result = queries.species().await;
    assert!(matches!(result, Err(ApiError::Api { status: 500, .. })), "got {result:?}");
    assert_eq!(env.hits("GET /species/"), 4);

    Ok(())
}

/// Tests that client errors are not retried.
#[tokio::test]
async fn test_client_error_is_not_retried() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;

    let result = queries.facility("missing").await;
    assert!(matches!(result, Err(ApiError::NotFound(ref m)) if m == "Facility not found"));
    assert_eq!(env.hits("GET /facilities/missing"), 1);

    Ok(())
}

/// Tests the species catalog, including the backend's 404 for an empty list.
#[tokio::test]
async fn test_species_catalog_and_assignment() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    let facility = env.seed_facility("North greenhouse");
    let plot = env.seed_plot(&facility, "Bed A");

    assert!(queries.species().await?.is_empty());

    let tomato = queries.create_species("Tomato").await?;
    assert_eq!(tomato.name, "Tomato");
    let species = queries.species().await?;
    assert_eq!(species.len(), 1);
    assert_eq!(species[0].species_id(), tomato.species_id());

    assert!(queries.plot(&plot).await?.species.is_none());
    queries.assign_species(tomato.species_id(), &plot, &facility).await?;
    assert_eq!(queries.plot(&plot).await?.species.as_deref(), Some("Tomato"));

    // The facility is part of the assignment.
    let result = queries.assign_species(tomato.species_id(), &plot, "fac-other").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    queries.delete_species(tomato.species_id()).await?;
    assert!(queries.species().await?.is_empty());

    Ok(())
}

/// Tests that history bounds reach the backend in RFC 3339.
#[tokio::test]
async fn test_plot_history_bounds() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    let facility = env.seed_facility("North greenhouse");
    let plot = env.seed_plot(&facility, "Bed A");

    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
    let history = queries.plot_history(&plot, Some(start), Some(end)).await?;
    assert_eq!(history.len(), 3);

    let query = env.world.lock().history_query.clone();
    assert_eq!(query.get("start_date").map(String::as_str), Some("2024-05-01T00:00:00Z"));
    assert_eq!(query.get("end_date").map(String::as_str), Some("2024-05-02T00:00:00Z"));

    // Different bounds are a different cache entry.
    queries.plot_history(&plot, Some(start), None).await?;
    assert_eq!(env.hits(&format!("GET /plot/{plot}/history")), 2);
    assert!(!env.world.lock().history_query.contains_key("end_date"));

    let inverted = queries.plot_history(&plot, Some(end), Some(start)).await;
    assert!(matches!(inverted, Err(ApiError::InvalidRequest(_))));
    assert_eq!(env.hits(&format!("GET /plot/{plot}/history")), 2);

    Ok(())
}

/// Tests that the live plot state is polled until the receiver goes away.
#[tokio::test]
async fn test_watch_plot_state_polls_until_dropped() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    let facility = env.seed_facility("North greenhouse");
    let plot = env.seed_plot(&facility, "Bed A");
    let route = format!("GET /plot/{plot}/state");

    let mut live = queries.watch_plot_state(&plot);
    let mut readings = Vec::new();
    while readings.len() < 3 {
        tokio::time::timeout(Duration::from_secs(5), live.changed()).await??;
        if let Some(state) = live.borrow_and_update().clone() {
            readings.push(state);
        }
    }

    assert!(readings.iter().all(|r| r.plot_id == plot));
    assert_ne!(readings[0].timestamp, readings[1].timestamp);
    assert!(env.hits(&route) >= 3);

    drop(live);
    tokio::time::sleep(Duration::from_millis(150)).await;
    let settled = env.hits(&route);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(env.hits(&route), settled, "polling continued after the receiver was dropped");

    Ok(())
}

/// Tests irrigation records and the optional lookups.
#[tokio::test]
async fn test_irrigation_records() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, _) = env.signed_in().await?;
    let facility = env.seed_facility("North greenhouse");
    let plot = env.seed_plot(&facility, "Bed A");
    let irrigation = queries.client().irrigation();

    assert!(queries.irrigations(&plot).await?.is_empty());
    assert!(irrigation.last(&plot).await?.is_none());
    assert!(irrigation.recommended(&plot).await?.is_none());

    let event = queries
        .record_irrigation(
            &plot,
            &CreateIrrigation {
                water_amount: Some(12.0),
                duration: Some(600.0),
                ..CreateIrrigation::default()
            },
        )
        .await?;
    assert_eq!(event.irrigation_type.as_deref(), Some("manual"));

    let events = queries.irrigations(&plot).await?;
    assert_eq!(events.len(), 1);
    assert_eq!(env.hits(&format!("GET /irrigations/plot/{plot}/irrigations")), 2);

    let last = irrigation.last(&plot).await?.expect("last irrigation");
    assert_eq!(last.timestamp, event.timestamp);

    Ok(())
}

/// Tests the user profile query and update.
#[tokio::test]
async fn test_user_profile_update() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let (_manager, queries, user_id) = env.signed_in().await?;

    let user = queries.user(&user_id).await?;
    assert!(user.name.is_none());

    queries
        .update_user(
            &user_id,
            &UpdateUser {
                name: Some("Ana Pech".to_string()),
                email: None,
            },
        )
        .await?;

    let user = queries.user(&user_id).await?;
    assert_eq!(user.name.as_deref(), Some("Ana Pech"));
    assert_eq!(env.hits(&format!("GET /users/{user_id}")), 2);

    Ok(())
}
