// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use anyhow::Result;
use common::{setup, Prefab};
use holdfast_core::asset::sprite_key;
use holdfast_core::telemetry::MetricId;
use holdfast_core::{AccessError, AssetGuid, AssetReference, Owner};
use holdfast_telemetry::Outcome;
use std::sync::Arc;

#[test]
fn test_second_load_is_served_from_the_cache() -> Result<()> {
    let (engine, access) = setup();
    engine.insert("char/hero.prefab", Prefab { name: "hero" });
    let owner = Owner::new("level");

    let first = access.load_asset::<Prefab>(&owner, "char/hero.prefab")?;
    let second = access.load_asset::<Prefab>(&owner, "char/hero.prefab")?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.name, "hero");
    assert_eq!(engine.load_count("char/hero.prefab"), 1);
    assert_eq!(owner.handle_count(), 1);
    assert_eq!(access.reporter().count(Outcome::Succeeded), 2);
    Ok(())
}

#[test]
fn test_owners_hold_independent_references() -> Result<()> {
    let (engine, access) = setup();
    engine.insert("a", String::from("A"));
    let left = Owner::new("left");
    let right = Owner::new("right");

    access.load_asset::<String>(&left, "a")?;
    access.load_asset::<String>(&right, "a")?;
    assert_eq!(engine.ref_count("a"), 2);

    left.destroy();
    assert_eq!(engine.ref_count("a"), 1);
    assert!(right.holds("a"));

    right.destroy();
    assert_eq!(engine.ref_count("a"), 0);
    Ok(())
}

#[test]
fn test_failed_load_is_evicted_and_retried() -> Result<()> {
    let (engine, access) = setup();
    engine.insert_failing("tex/rock.png", "decoder missing");
    let owner = Owner::new("level");

    let err = access.load_asset::<String>(&owner, "tex/rock.png").unwrap_err();
    assert!(matches!(err, AccessError::OperationFailed { .. }));
    assert!(!owner.holds("tex/rock.png"));
    assert_eq!(engine.total_refs(), 0);

    engine.insert("tex/rock.png", String::from("rock"));
    let rock = access.load_asset::<String>(&owner, "tex/rock.png")?;
    assert_eq!(rock.as_str(), "rock");
    assert_eq!(engine.load_count("tex/rock.png"), 2);
    assert_eq!(access.reporter().count(Outcome::Failed), 1);
    Ok(())
}

#[test]
fn test_destroy_releases_every_cached_handle() -> Result<()> {
    let (engine, access) = setup();
    for key in ["a", "b", "c"] {
        engine.insert(key, key.to_string());
    }
    let owner = Owner::new("level");
    for key in ["a", "b", "c"] {
        access.load_asset::<String>(&owner, key)?;
    }
    assert_eq!(engine.total_refs(), 3);

    owner.destroy();
    assert_eq!(engine.total_refs(), 0);
    assert_eq!(owner.handle_count(), 0);

    let err = access.load_asset::<String>(&owner, "a").unwrap_err();
    assert!(matches!(err, AccessError::OwnerDestroyed { .. }));
    assert_eq!(engine.load_count("a"), 1);
    Ok(())
}

#[test]
fn test_refused_release_does_not_stop_the_cascade() -> Result<()> {
    let (engine, access) = setup();
    engine.insert("a", String::from("A"));
    engine.insert("b", String::from("B"));
    let owner = Owner::new("level");
    access.load_asset::<String>(&owner, "a")?;
    access.load_asset::<String>(&owner, "b")?;

    engine.refuse_release("a");
    owner.destroy();

    assert_eq!(engine.ref_count("a"), 1);
    assert_eq!(engine.ref_count("b"), 0);
    assert_eq!(owner.handle_count(), 0);
    Ok(())
}

#[test]
fn test_dropping_the_owner_releases_its_handles() -> Result<()> {
    let (engine, access) = setup();
    engine.insert("a", String::from("A"));
    {
        let owner = Owner::new("transient");
        access.load_asset::<String>(&owner, "a")?;
        assert_eq!(engine.ref_count("a"), 1);
    }
    assert_eq!(engine.ref_count("a"), 0);
    Ok(())
}

#[test]
fn test_references_and_paths_are_separate_keys() -> Result<()> {
    let (engine, access) = setup();
    let reference = AssetReference::new(AssetGuid::from_path("char/hero.prefab"));
    engine.insert(reference.key(), Prefab { name: "by guid" });
    engine.insert("char/hero.prefab", Prefab { name: "by path" });
    let owner = Owner::new("level");

    let by_guid = access.load_asset::<Prefab>(&owner, &reference)?;
    let by_path = access.load_asset::<Prefab>(&owner, "char/hero.prefab")?;

    assert_eq!(by_guid.name, "by guid");
    assert_eq!(by_path.name, "by path");
    assert_eq!(owner.handle_count(), 2);
    Ok(())
}

#[test]
fn test_sprite_keys_dedup_like_plain_keys() -> Result<()> {
    let (engine, access) = setup();
    let key = sprite_key("tex/sheet.png", Some(2));
    assert_eq!(key.as_str(), "tex/sheet.png[sheet_2]");
    engine.insert(key.clone(), String::from("frame"));
    let owner = Owner::new("hud");

    access.load_sprite::<String>(&owner, "tex/sheet.png", 2usize)?;
    access.load_asset::<String>(&owner, key.clone())?;

    assert_eq!(engine.load_count(key), 1);
    Ok(())
}

#[test]
fn test_live_handle_gauge_tracks_cached_entries() -> Result<()> {
    let (engine, access) = setup();
    engine.insert("a", String::from("A"));
    engine.insert("b", String::from("B"));
    let owner = Owner::new("level");
    let live = || -> Result<Option<f64>> {
        let metric = access
            .metrics()
            .get_metric(&MetricId::new("assets", "live_handles"))?;
        Ok(metric.value.as_gauge())
    };

    access.load_asset::<String>(&owner, "a")?;
    access.load_asset::<String>(&owner, "b")?;
    assert_eq!(live()?, Some(2.0));

    owner.destroy();
    assert_eq!(live()?, Some(0.0));
    Ok(())
}
