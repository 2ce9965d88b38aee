//! # Material Commands
//!
//! Inventory of filament rolls, resin and other consumables.
//!
//! A material's status follows its quantity: at or below the configured
//! low-stock threshold it is `low`, at zero it is `out`. Deleting moves it to
//! `inactive`, which hides it from the list.

use tracing::info;

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionManager};
use filamento_core::validation::validate_material_draft;
use filamento_core::{Material, MaterialDraft, MaterialStatus};
use filamento_db::repository::generate_id;

/// Materials that are not deleted, newest first.
pub async fn list_materials(db: &DbState) -> Result<Vec<Material>, ApiError> {
    Ok(db.cached(&db.caches().materials, db.inner().materials()).await?)
}

pub async fn add_material(
    db: &DbState,
    sessions: &SessionManager,
    config: &ConfigState,
    draft: MaterialDraft,
) -> Result<Material, ApiError> {
    validate_material_draft(&draft)?;
    let session = sessions.require_session().await?;

    let status = MaterialStatus::for_quantity(draft.quantity, config.low_stock_threshold);
    let material = Material::from_draft(generate_id(), draft, status, Some(session.user_id), db.now());
    let material = db.inner().materials().insert(&material).await?;
    db.caches().materials.invalidate();

    info!(material_id = %material.id, status = status.as_str(), "Material added");
    Ok(material)
}

/// Replaces a material's editable fields and recomputes its status.
pub async fn update_material(
    db: &DbState,
    sessions: &SessionManager,
    config: &ConfigState,
    id: &str,
    draft: MaterialDraft,
) -> Result<Material, ApiError> {
    validate_material_draft(&draft)?;
    sessions.require_session().await?;

    let status = MaterialStatus::for_quantity(draft.quantity, config.low_stock_threshold);
    let material = db
        .inner()
        .materials()
        .update(id, &draft, status, db.now())
        .await?;
    db.caches().materials.invalidate();

    info!(material_id = %id, status = status.as_str(), "Material updated");
    Ok(material)
}

pub async fn delete_material(
    db: &DbState,
    sessions: &SessionManager,
    id: &str,
) -> Result<(), ApiError> {
    sessions.require_session().await?;

    db.inner().materials().soft_delete(id, db.now()).await?;
    db.caches().materials.invalidate();

    info!(material_id = %id, "Material deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn pla(quantity: f64) -> MaterialDraft {
        MaterialDraft {
            name: "PLA Negro".to_string(),
            material_type: "PLA".to_string(),
            quantity,
            unit: "g".to_string(),
            unit_cost: 0.025,
            purchase_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            supplier: Some("Filamentos Sur".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_status_follows_quantity() {
        let h = testing::signed_in().await;

        let full = add_material(&h.db, &h.sessions, &h.config, pla(1000.0)).await.unwrap();
        assert_eq!(full.status, MaterialStatus::Active);

        let low = update_material(&h.db, &h.sessions, &h.config, &full.id, pla(150.0))
            .await
            .unwrap();
        assert_eq!(low.status, MaterialStatus::Low);

        let out = update_material(&h.db, &h.sessions, &h.config, &full.id, pla(0.0))
            .await
            .unwrap();
        assert_eq!(out.status, MaterialStatus::Out);
    }

    #[tokio::test]
    async fn test_threshold_comes_from_config() {
        let h = testing::signed_in().await;
        let config = ConfigState {
            low_stock_threshold: 500.0,
            ..h.config.clone()
        };

        let m = add_material(&h.db, &h.sessions, &config, pla(400.0)).await.unwrap();
        assert_eq!(m.status, MaterialStatus::Low);
    }

    #[tokio::test]
    async fn test_delete_hides_material() {
        let h = testing::signed_in().await;
        let m = add_material(&h.db, &h.sessions, &h.config, pla(1000.0)).await.unwrap();
        assert_eq!(list_materials(&h.db).await.unwrap().len(), 1);

        delete_material(&h.db, &h.sessions, &m.id).await.unwrap();
        assert!(list_materials(&h.db).await.unwrap().is_empty());

        let err = update_material(&h.db, &h.sessions, &h.config, &m.id, pla(10.0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_rejects_invalid_draft() {
        let h = testing::signed_in().await;

        let mut draft = pla(100.0);
        draft.name = String::new();
        let err = add_material(&h.db, &h.sessions, &h.config, draft).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add_material(&h.db, &h.sessions, &h.config, pla(-1.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let h = testing::signed_out().await;

        let err = add_material(&h.db, &h.sessions, &h.config, pla(100.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
    }
}
