//! Self-referential hierarchies (locations, categories).
//!
//! Nodes live in one table each and point at their parent by id; traversal is
//! repeated lookup, never embedded child pointers. The only removal path is
//! deactivation, which is refused while active children remain.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;
use tracing::instrument;

use crate::db::run_in_transaction;
use crate::entity::category::{self, Entity as CategoryEntity};
use crate::entity::location::{self, Entity as LocationEntity};
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::model::taxonomy::{CategoryCreateRequest, LocationCreateRequest, TreeQuery};

/// Most levels a hierarchy may have, counting the root as level 1.
///
/// Create and reparent refuse to go deeper, so walks that exceed it are looking at corrupt links.
pub const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLink {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub is_active: bool,
}

/// A table whose rows form a parent-linked forest.
pub trait TreeEntity: EntityTrait {
    fn id_column() -> Self::Column;
    fn parent_column() -> Self::Column;
    fn active_column() -> Self::Column;
    fn name_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;
    /// Sibling order for listings; `id` is always appended as the final tie-breaker.
    fn order_columns() -> Vec<Self::Column>;
    fn link(model: &Self::Model) -> NodeLink;
    fn not_found() -> ErrorCode;

    fn type_column() -> Option<Self::Column> {
        None
    }
}

impl TreeEntity for LocationEntity {
    fn id_column() -> location::Column {
        location::Column::Id
    }
    fn parent_column() -> location::Column {
        location::Column::ParentId
    }
    fn active_column() -> location::Column {
        location::Column::IsActive
    }
    fn name_column() -> location::Column {
        location::Column::Name
    }
    fn updated_at_column() -> location::Column {
        location::Column::UpdatedAt
    }
    fn order_columns() -> Vec<location::Column> {
        vec![location::Column::Name]
    }
    fn link(model: &location::Model) -> NodeLink {
        NodeLink { id: model.id, parent_id: model.parent_id, is_active: model.is_active }
    }
    fn not_found() -> ErrorCode {
        ErrorCode::LocationNotFound
    }
    fn type_column() -> Option<location::Column> {
        Some(location::Column::LocationType)
    }
}

impl TreeEntity for CategoryEntity {
    fn id_column() -> category::Column {
        category::Column::Id
    }
    fn parent_column() -> category::Column {
        category::Column::ParentId
    }
    fn active_column() -> category::Column {
        category::Column::IsActive
    }
    fn name_column() -> category::Column {
        category::Column::Name
    }
    fn updated_at_column() -> category::Column {
        category::Column::UpdatedAt
    }
    fn order_columns() -> Vec<category::Column> {
        vec![category::Column::SortOrder, category::Column::Name]
    }
    fn link(model: &category::Model) -> NodeLink {
        NodeLink { id: model.id, parent_id: model.parent_id, is_active: model.is_active }
    }
    fn not_found() -> ErrorCode {
        ErrorCode::CategoryNotFound
    }
}

pub async fn find_node<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<E::Model, AppError> {
    E::find()
        .filter(E::id_column().eq(id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::with_detail(E::not_found(), format!("id {id}")))
}

async fn lock_node<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<E::Model, AppError> {
    E::find()
        .filter(E::id_column().eq(id))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::with_detail(E::not_found(), format!("id {id}")))
}

/// Locks the proposed parent so a concurrent deactivation cannot slip past a new active child.
async fn ensure_parent<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    parent_id: i32,
    child_active: bool,
) -> Result<NodeLink, AppError> {
    let parent = E::link(&lock_node::<E, C>(conn, parent_id).await?);
    if child_active && !parent.is_active {
        return Err(AppError::with_detail(ErrorCode::InactiveParent, format!("parent {parent_id}")));
    }
    Ok(parent)
}

/// Refuses to hang a subtree `height` levels tall beneath `parent_id` when that passes `MAX_TREE_DEPTH`.
async fn ensure_room<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    parent_id: i32,
    height: usize,
) -> Result<(), AppError> {
    let depth = ancestor_ids::<E, C>(conn, parent_id).await?.len() + 1 + height;
    if depth > MAX_TREE_DEPTH {
        return Err(AppError::with_detail(
            ErrorCode::HierarchyTooDeep,
            format!("{depth} levels under parent {parent_id}, limit is {MAX_TREE_DEPTH}"),
        ));
    }
    Ok(())
}

/// Ancestor ids of `id`, nearest first, ending at the root.
pub async fn ancestor_ids<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Vec<i32>, AppError> {
    let mut chain = Vec::new();
    let mut current = E::link(&find_node::<E, C>(conn, id).await?).parent_id;

    while let Some(ancestor) = current {
        if ancestor == id || chain.contains(&ancestor) || chain.len() + 1 >= MAX_TREE_DEPTH {
            return Err(AppError::with_detail(
                ErrorCode::CyclicHierarchy,
                format!("ancestor chain of {id} does not reach a root"),
            ));
        }
        chain.push(ancestor);
        current = E::link(&find_node::<E, C>(conn, ancestor).await?).parent_id;
    }

    Ok(chain)
}

/// Whether `node_id` lies in the subtree rooted at `ancestor_id` (a node is in its own subtree).
pub async fn is_descendant_in<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    node_id: i32,
    ancestor_id: i32,
) -> Result<bool, AppError> {
    find_node::<E, C>(conn, ancestor_id).await?;
    if node_id == ancestor_id {
        find_node::<E, C>(conn, node_id).await?;
        return Ok(true);
    }
    Ok(ancestor_ids::<E, C>(conn, node_id).await?.contains(&ancestor_id))
}

#[instrument(skip(db))]
pub async fn is_descendant<E: TreeEntity>(
    db: &DatabaseConnection,
    node_id: i32,
    ancestor_id: i32,
) -> Result<bool, AppError> {
    is_descendant_in::<E, _>(db, node_id, ancestor_id).await
}

/// Children of `parent_id`, or the roots when `None`, in sibling order.
pub async fn list_children<E: TreeEntity>(
    db: &DatabaseConnection,
    parent_id: Option<i32>,
    include_inactive: bool,
) -> Result<Vec<E::Model>, AppError> {
    let mut query = E::find();
    query = match parent_id {
        Some(parent_id) => {
            find_node::<E, _>(db, parent_id).await?;
            query.filter(E::parent_column().eq(parent_id))
        }
        None => query.filter(E::parent_column().is_null()),
    };
    if !include_inactive {
        query = query.filter(E::active_column().eq(true));
    }
    for column in E::order_columns() {
        query = query.order_by_asc(column);
    }

    Ok(query.order_by_asc(E::id_column()).all(db).await?)
}

pub async fn search<E: TreeEntity>(
    db: &DatabaseConnection,
    filter: &TreeQuery,
) -> Result<Vec<E::Model>, AppError> {
    let include_inactive = filter.include_inactive.unwrap_or(false);
    if filter.roots_only.unwrap_or(false) {
        return list_children::<E>(db, None, include_inactive).await;
    }

    let mut query = E::find();
    if !include_inactive {
        query = query.filter(E::active_column().eq(true));
    }
    if let Some(parent_id) = filter.parent_id {
        query = query.filter(E::parent_column().eq(parent_id));
    }
    if let (Some(node_type), Some(column)) = (&filter.node_type, E::type_column()) {
        query = query.filter(column.eq(node_type.as_str()));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(E::name_column().like(format!("%{term}%")));
    }
    for column in E::order_columns() {
        query = query.order_by_asc(column);
    }

    Ok(query.order_by_asc(E::id_column()).all(db).await?)
}

/// Ids of the subtree rooted at `root_id`, root first, breadth-first.
pub async fn subtree_ids<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    root_id: i32,
    include_inactive: bool,
) -> Result<Vec<i32>, AppError> {
    let levels = subtree_levels::<E, C>(conn, root_id, include_inactive).await?;
    Ok(levels.into_iter().flatten().collect())
}

/// The subtree of `root_id` one level per entry, starting with `[root_id]`.
async fn subtree_levels<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    root_id: i32,
    include_inactive: bool,
) -> Result<Vec<Vec<i32>>, AppError> {
    find_node::<E, C>(conn, root_id).await?;

    let mut seen: HashSet<i32> = HashSet::from([root_id]);
    let mut levels = Vec::new();
    let mut frontier = vec![root_id];

    while !frontier.is_empty() {
        if levels.len() >= MAX_TREE_DEPTH {
            return Err(AppError::with_detail(
                ErrorCode::HierarchyTooDeep,
                format!("subtree of {root_id} runs past {MAX_TREE_DEPTH} levels"),
            ));
        }
        let mut query = E::find()
            .select_only()
            .column(E::id_column())
            .filter(E::parent_column().is_in(frontier.clone()));
        if !include_inactive {
            query = query.filter(E::active_column().eq(true));
        }
        let children: Vec<i32> = query.into_tuple().all(conn).await?;

        levels.push(frontier);
        frontier = children.into_iter().filter(|id| seen.insert(*id)).collect();
    }

    Ok(levels)
}

/// Flips `is_active` off. Idempotent; refused while any active child exists.
#[instrument(skip(db))]
pub async fn deactivate<E: TreeEntity>(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    run_in_transaction(db, |txn| Box::pin(deactivate_in::<E, _>(txn, id))).await
}

async fn deactivate_in<E: TreeEntity, C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), AppError> {
    let node = E::link(&lock_node::<E, C>(conn, id).await?);
    if !node.is_active {
        return Ok(());
    }

    let active_child = E::find()
        .filter(E::parent_column().eq(id))
        .filter(E::active_column().eq(true))
        .one(conn)
        .await?;
    if let Some(child) = active_child {
        return Err(AppError::with_detail(
            ErrorCode::ActiveChildrenExist,
            format!("node {id} has active child {}", E::link(&child).id),
        ));
    }

    set_active::<E, C>(conn, id, false).await
}

/// Re-enables a node; refused while its parent is inactive.
#[instrument(skip(db))]
pub async fn activate<E: TreeEntity>(db: &DatabaseConnection, id: i32) -> Result<(), AppError> {
    run_in_transaction(db, |txn| Box::pin(activate_in::<E, _>(txn, id))).await
}

async fn activate_in<E: TreeEntity, C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), AppError> {
    let node = E::link(&lock_node::<E, C>(conn, id).await?);
    if node.is_active {
        return Ok(());
    }
    if let Some(parent_id) = node.parent_id {
        ensure_parent::<E, C>(conn, parent_id, true).await?;
    }

    set_active::<E, C>(conn, id, true).await
}

async fn set_active<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    id: i32,
    active: bool,
) -> Result<(), AppError> {
    E::update_many()
        .col_expr(E::active_column(), Expr::value(active))
        .col_expr(E::updated_at_column(), Expr::value(Utc::now()))
        .filter(E::id_column().eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Moves a node under `new_parent` (or to the root level), rejecting moves into its own subtree.
#[instrument(skip(db))]
pub async fn reparent<E: TreeEntity>(
    db: &DatabaseConnection,
    id: i32,
    new_parent: Option<i32>,
) -> Result<E::Model, AppError> {
    run_in_transaction(db, |txn| Box::pin(reparent_in::<E, _>(txn, id, new_parent))).await
}

async fn reparent_in<E: TreeEntity, C: ConnectionTrait>(
    conn: &C,
    id: i32,
    new_parent: Option<i32>,
) -> Result<E::Model, AppError> {
    let node = E::link(&lock_node::<E, C>(conn, id).await?);

    if let Some(parent_id) = new_parent {
        ensure_parent::<E, C>(conn, parent_id, node.is_active).await?;
        if is_descendant_in::<E, C>(conn, parent_id, id).await? {
            return Err(AppError::with_detail(
                ErrorCode::CyclicHierarchy,
                format!("{parent_id} lies inside the subtree of {id}"),
            ));
        }
        let height = subtree_levels::<E, C>(conn, id, true).await?.len();
        ensure_room::<E, C>(conn, parent_id, height).await?;
    }

    E::update_many()
        .col_expr(E::parent_column(), Expr::value(new_parent))
        .col_expr(E::updated_at_column(), Expr::value(Utc::now()))
        .filter(E::id_column().eq(id))
        .exec(conn)
        .await?;

    find_node::<E, C>(conn, id).await
}

#[instrument(skip(db, request), fields(name = %request.name))]
pub async fn create_location(
    db: &DatabaseConnection,
    request: LocationCreateRequest,
) -> Result<location::Model, AppError> {
    let mut errors = Vec::new();
    if request.name.trim().is_empty() {
        errors.push(ValidationFieldError::new("name", "name is required"));
    }
    if request.location_type.trim().is_empty() {
        errors.push(ValidationFieldError::new("type", "type is required"));
    }
    AppError::check(errors)?;

    run_in_transaction(db, |txn| {
        let request = request.clone();
        Box::pin(async move {
            if let Some(parent_id) = request.parent_id {
                ensure_parent::<LocationEntity, _>(txn, parent_id, true).await?;
                ensure_room::<LocationEntity, _>(txn, parent_id, 1).await?;
            }

            let node = location::ActiveModel {
                name: Set(request.name.trim().to_string()),
                location_type: Set(request.location_type.trim().to_string()),
                parent_id: Set(request.parent_id),
                latitude: Set(request.latitude),
                longitude: Set(request.longitude),
                postal_code: Set(request.postal_code),
                population: Set(request.population),
                description: Set(request.description),
                is_active: Set(true),
                updated_at: Set(None),
                ..Default::default()
            };
            Ok(node.insert(txn).await?)
        })
    })
    .await
}

#[instrument(skip(db, request), fields(name = %request.name))]
pub async fn create_category(
    db: &DatabaseConnection,
    request: CategoryCreateRequest,
) -> Result<category::Model, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::ValidationError(vec![ValidationFieldError::new(
            "name",
            "name is required",
        )]));
    }

    run_in_transaction(db, |txn| {
        let request = request.clone();
        Box::pin(async move {
            let name = request.name.trim().to_string();
            let duplicate = CategoryEntity::find()
                .filter(category::Column::Name.eq(name.as_str()))
                .one(txn)
                .await?;
            if duplicate.is_some() {
                return Err(AppError::with_detail(ErrorCode::DuplicateEntry, name));
            }
            if let Some(parent_id) = request.parent_id {
                ensure_parent::<CategoryEntity, _>(txn, parent_id, true).await?;
                ensure_room::<CategoryEntity, _>(txn, parent_id, 1).await?;
            }

            let node = category::ActiveModel {
                name: Set(name),
                description: Set(request.description),
                color_code: Set(request.color_code),
                icon_name: Set(request.icon_name),
                parent_id: Set(request.parent_id),
                is_active: Set(true),
                sort_order: Set(request.sort_order.unwrap_or(0)),
                updated_at: Set(None),
                ..Default::default()
            };
            Ok(node.insert(txn).await?)
        })
    })
    .await
}
