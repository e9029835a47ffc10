use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UpdateUserRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult, translate_constraint_violation},
    middleware::auth::{AuthUser, ensure_admin, role},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::{PageRequest, SearchQuery, like_pattern, text_filter},
    services::auth_service::hash_password,
    state::AppState,
};

pub const MODIFY_LOCKED_USER_NOT_PERMITTED: &str =
    "User has been locked and cannot be modified or deleted";
pub const DELETING_SELF_NOT_PERMITTED: &str = "You cannot delete your own account";
pub const DUPLICATE_EMAIL: &str = "There is already a user with that email address.";

/// Matches the filter against email, first name, last name or role.
fn matching(filter: Option<&str>) -> Select<Users> {
    let finder = Users::find();
    match filter {
        Some(filter) => {
            let pattern = like_pattern(filter);
            finder.filter(
                Condition::any()
                    .add(Expr::col(Column::Email).ilike(pattern.clone()))
                    .add(Expr::col(Column::FirstName).ilike(pattern.clone()))
                    .add(Expr::col(Column::LastName).ilike(pattern.clone()))
                    .add(Expr::col(Column::Role).ilike(pattern)),
            )
        }
        None => finder,
    }
}

pub async fn find_any_matching<C: ConnectionTrait>(
    db: &C,
    filter: Option<&str>,
    page: PageRequest,
) -> AppResult<Vec<UserModel>> {
    let items = matching(filter)
        .order_by_asc(Column::Email)
        .limit(page.limit())
        .offset(page.offset())
        .all(db)
        .await?;
    Ok(items)
}

pub async fn count_any_matching<C: ConnectionTrait>(db: &C, filter: Option<&str>) -> AppResult<u64> {
    Ok(matching(filter).count(db).await?)
}

pub fn throw_if_user_locked(user: &UserModel) -> AppResult<()> {
    if user.locked {
        return Err(AppError::UserFriendly(MODIFY_LOCKED_USER_NOT_PERMITTED.into()));
    }
    Ok(())
}

pub fn throw_if_deleting_self(current: &AuthUser, user: &UserModel) -> AppResult<()> {
    if current.user_id == user.id {
        return Err(AppError::UserFriendly(DELETING_SELF_NOT_PERMITTED.into()));
    }
    Ok(())
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: SearchQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let page = query.page_request();
    let filter = text_filter(query.q.as_deref());

    let total = count_any_matching(&state.orm, filter).await?;
    let items = find_any_matching(&state.orm, filter, page)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::for_page(&page, total)),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::single("User", found.into()))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let email = required("Email", &payload.email)?;
    let first_name = required("First name", &payload.first_name)?;
    let last_name = required("Last name", &payload.last_name)?;
    validate_role(&payload.role)?;
    validate_password(&payload.password)?;

    let created = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        first_name: Set(first_name),
        last_name: Set(last_name),
        role: Set(payload.role),
        locked: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| translate_constraint_violation(err, DUPLICATE_EMAIL, None))?;

    tracing::info!(user_id = %created.id, role = %created.role, "user created");
    audit::record(
        &state.pool,
        user.user_id,
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id }),
    )
    .await;

    Ok(ApiResponse::single("User created", created.into()))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    throw_if_user_locked(&existing)?;

    let mut active: ActiveModel = existing.into();
    if let Some(email) = payload.email {
        active.email = Set(required("Email", &email)?);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(required("First name", &first_name)?);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(required("Last name", &last_name)?);
    }
    if let Some(new_role) = payload.role {
        validate_role(&new_role)?;
        active.role = Set(new_role);
    }
    if let Some(password) = payload.password {
        validate_password(&password)?;
        active.password_hash = Set(hash_password(&password)?);
    }

    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| translate_constraint_violation(err, DUPLICATE_EMAIL, None))?;

    audit::record(
        &state.pool,
        user.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id }),
    )
    .await;

    Ok(ApiResponse::single("Updated", updated.into()))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let target = Users::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    throw_if_deleting_self(user, &target)?;
    throw_if_user_locked(&target)?;

    target.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = %id, "user deleted");
    audit::record(
        &state.pool,
        user.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::single("Deleted", serde_json::json!({})))
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn validate_role(value: &str) -> AppResult<()> {
    if !role::is_known(value) {
        return Err(AppError::BadRequest(format!(
            "Unknown role '{value}', expected one of {}",
            role::ALL.join(", ")
        )));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < 6 {
        return Err(AppError::BadRequest(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DbBackend, QueryTrait};

    fn model(locked: bool) -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            email: "baker@vaadin.com".into(),
            password_hash: "x".into(),
            first_name: "Heidi".into(),
            last_name: "Carter".into(),
            role: role::BAKER.into(),
            locked,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn locked_users_cannot_be_modified() {
        let err = throw_if_user_locked(&model(true)).unwrap_err();
        assert_eq!(err.to_string(), MODIFY_LOCKED_USER_NOT_PERMITTED);
        assert!(throw_if_user_locked(&model(false)).is_ok());
    }

    #[test]
    fn users_cannot_delete_themselves() {
        let target = model(false);
        let me = AuthUser {
            user_id: target.id,
            role: role::ADMIN.into(),
        };
        let err = throw_if_deleting_self(&me, &target).unwrap_err();
        assert_eq!(err.to_string(), DELETING_SELF_NOT_PERMITTED);

        let someone_else = AuthUser {
            user_id: Uuid::new_v4(),
            role: role::ADMIN.into(),
        };
        assert!(throw_if_deleting_self(&someone_else, &target).is_ok());
    }

    #[test]
    fn filter_spans_email_names_and_role() {
        let sql = matching(Some("bak")).build(DbBackend::Postgres).to_string();
        assert_eq!(sql.matches("ILIKE '%bak%'").count(), 4, "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
    }

    #[test]
    fn validates_role_and_password() {
        assert!(validate_role("barista").is_ok());
        assert!(matches!(validate_role("owner"), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_password("123"), Err(AppError::BadRequest(_))));
        assert!(validate_password("secret1").is_ok());
    }
}
