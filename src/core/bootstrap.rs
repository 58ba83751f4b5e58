use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;

/// Mauritanian primary-school barème: per-class subject weights, as published
/// by the ministry for the primary cycle.
const DEFAULT_CATALOG: &[(&str, &[(&str, f64)])] = &[
    ("CP1", &[("Arabe", 30.0), ("Français", 20.0), ("Mathématiques", 40.0), ("Éveil", 10.0)]),
    ("CP2", &[("Arabe", 30.0), ("Français", 20.0), ("Mathématiques", 40.0), ("Éveil", 10.0)]),
    ("CE1", &[("Arabe", 30.0), ("Français", 20.0), ("Mathématiques", 40.0), ("Sciences", 10.0)]),
    ("CE2", &[("Arabe", 30.0), ("Français", 20.0), ("Mathématiques", 40.0), ("Sciences", 10.0)]),
    (
        "CM1",
        &[
            ("Arabe", 30.0),
            ("Français", 20.0),
            ("Mathématiques", 40.0),
            ("Histoire-Géographie", 10.0),
        ],
    ),
    (
        "CM2",
        &[
            ("Arabe", 30.0),
            ("Français", 20.0),
            ("Mathématiques", 50.0),
            ("Sciences", 40.0),
            ("Histoire-Géographie", 10.0),
        ],
    ),
];

const DEFAULT_CLASS_CAPACITY: i32 = 40;

pub(crate) async fn ensure_defaults(state: &AppState) -> anyhow::Result<()> {
    let school_id = match repositories::schools::find_first(state.db()).await? {
        Some(school) => school.id,
        None => {
            let school_id = create_default_school(state).await?;
            if state.settings().school().seed_catalog {
                seed_catalog(state, &school_id).await?;
            }
            school_id
        }
    };

    ensure_director(state, &school_id).await?;
    Ok(())
}

async fn create_default_school(state: &AppState) -> anyhow::Result<String> {
    let school = state.settings().school();
    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();

    repositories::schools::create(
        state.db(),
        repositories::schools::CreateSchool {
            id: &id,
            name: &school.name,
            name_ar: Some(&school.name_ar),
            address: Some(&school.address),
            phone: Some(&school.phone),
            email: Some(&school.email),
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!(school = %school.name, "Created default school");
    Ok(id)
}

async fn seed_catalog(state: &AppState, school_id: &str) -> anyhow::Result<()> {
    let now = primitive_now_utc();

    for (class_name, subjects) in DEFAULT_CATALOG {
        let class_id = Uuid::new_v4().to_string();
        repositories::classes::create(
            state.db(),
            repositories::classes::CreateClass {
                id: &class_id,
                school_id,
                teacher_id: None,
                name: class_name,
                level: "Primaire",
                capacity: DEFAULT_CLASS_CAPACITY,
                created_at: now,
                updated_at: now,
            },
        )
        .await?;

        for (subject_name, max_score) in *subjects {
            repositories::subjects::create(
                state.db(),
                repositories::subjects::CreateSubject {
                    id: &Uuid::new_v4().to_string(),
                    school_id,
                    class_id: &class_id,
                    teacher_id: None,
                    name: subject_name,
                    name_ar: None,
                    max_score: *max_score,
                    coefficient: 1.0,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await?;
        }
    }

    tracing::info!("Seeded default class and subject catalog");
    Ok(())
}

async fn ensure_director(state: &AppState, school_id: &str) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_director_password.is_empty() {
        tracing::warn!("FIRST_DIRECTOR_PASSWORD not configured; skipping director creation");
        return Ok(());
    }

    let email = &admin.first_director_email;
    let user = repositories::users::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let mut needs_update = false;
        let verified =
            security::verify_password(&admin.first_director_password, &user.hashed_password)
                .unwrap_or(false);

        let hashed_password = if verified {
            user.hashed_password.clone()
        } else {
            needs_update = true;
            security::hash_password(&admin.first_director_password)?
        };

        let role = if user.role != UserRole::Director {
            needs_update = true;
            UserRole::Director
        } else {
            user.role
        };

        let is_active = if !user.is_active {
            needs_update = true;
            true
        } else {
            user.is_active
        };

        if needs_update {
            sqlx::query(
                "UPDATE users
                 SET hashed_password = $1,
                     role = $2,
                     is_active = $3,
                     updated_at = $4
                 WHERE id = $5",
            )
            .bind(hashed_password)
            .bind(role)
            .bind(is_active)
            .bind(now)
            .bind(user.id)
            .execute(state.db())
            .await?;

            tracing::info!("Updated default director {email}");
        } else {
            tracing::info!("Default director already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_director_password)?;

    repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            school_id,
            email,
            hashed_password,
            first_name: "Admin",
            last_name: "User",
            phone: None,
            role: UserRole::Director,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default director {email}");
    Ok(())
}
