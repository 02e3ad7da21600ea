//! Order store: the collaborator boundary both actors write through.
//!
//! Every accepted write is persisted first and then published on the event
//! bus with the full new state. Order writes are serialized per order, so two
//! actors patching different fields of the same order never lose each other's
//! update.

use crate::engine::event_bus::EventBus;
use crate::notifier::{MessageSubscription, OrderSubscription};
use crate::scoring::ManufacturerScorer;
use crate::state::{
	apply_patch, changed_fields, mirror_status, MatchRegistry, MatchRegistryError,
	OrderStateError, OrderStateMachine, OwnershipError, PatchError, ValidationError,
};
use crate::utils::KeyedLocks;
use crate::workflow::{self, resolver, GateDenied, ResolveError, WorkflowSnapshot};
use atelier_storage::{StorageError, StorageService};
use atelier_types::{
	truncate_id, Actor, CreateDesignRequest, Design, DesignEvent, DesignRequirements,
	ManufacturerMatch, ManufacturerProfile, MatchEvent, MatchStatus, Message, MessageEvent,
	Order, OrderEvent, OrderPatch, Resolution, Role, RoleView, Stage, StorageKey,
	WorkflowEvent,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors surfaced at the collaborator boundary.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error(transparent)]
	Validation(#[from] ValidationError),
	#[error(transparent)]
	Ownership(#[from] OwnershipError),
	#[error(transparent)]
	Gate(#[from] GateDenied),
	#[error(transparent)]
	Resolve(#[from] ResolveError),
	#[error("{0} not found")]
	NotFound(String),
	#[error("Invalid transition: {0}")]
	InvalidTransition(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl StoreError {
	/// Whether retrying the same call may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, StoreError::Storage(_))
	}
}

impl From<PatchError> for StoreError {
	fn from(err: PatchError) -> Self {
		match err {
			PatchError::Validation(e) => StoreError::Validation(e),
			PatchError::Ownership(e) => StoreError::Ownership(e),
			PatchError::Gate(e) => StoreError::Gate(e),
		}
	}
}

impl From<OrderStateError> for StoreError {
	fn from(err: OrderStateError) -> Self {
		match err {
			OrderStateError::Storage(e) => StoreError::Storage(e),
			OrderStateError::OrderNotFound(id) => StoreError::NotFound(format!("order {}", id)),
			OrderStateError::Patch(e) => e.into(),
		}
	}
}

impl From<MatchRegistryError> for StoreError {
	fn from(err: MatchRegistryError) -> Self {
		match err {
			MatchRegistryError::Storage(e) => StoreError::Storage(e),
			MatchRegistryError::MatchNotFound(id) => StoreError::NotFound(format!("match {}", id)),
			MatchRegistryError::InvalidTransition { from, to } => {
				StoreError::InvalidTransition(format!("match is already {}, cannot become {}", from, to))
			},
			MatchRegistryError::Ownership(e) => StoreError::Ownership(e),
		}
	}
}

fn storage_err(e: StorageError) -> StoreError {
	StoreError::Storage(e.to_string())
}

fn not_found(what: &str, id: &str) -> impl FnOnce(StorageError) -> StoreError {
	let label = format!("{} {}", what, id);
	move |e| match e {
		StorageError::NotFound => StoreError::NotFound(label),
		other => StoreError::Storage(other.to_string()),
	}
}

/// Server-held source of truth for designs, orders, matches and messages.
pub struct OrderStore {
	storage: Arc<StorageService>,
	orders: OrderStateMachine,
	matches: MatchRegistry,
	event_bus: EventBus,
	scorer: Arc<dyn ManufacturerScorer>,
	/// Serializes design writes and message sequence allocation.
	locks: KeyedLocks,
	max_requests: usize,
}

impl OrderStore {
	pub fn new(
		storage: Arc<StorageService>,
		event_bus: EventBus,
		scorer: Arc<dyn ManufacturerScorer>,
		max_requests: usize,
	) -> Self {
		Self {
			orders: OrderStateMachine::new(storage.clone()),
			matches: MatchRegistry::new(storage.clone()),
			storage,
			event_bus,
			scorer,
			locks: KeyedLocks::new(),
			max_requests,
		}
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	// designs

	#[instrument(skip_all, fields(designer_id = %truncate_id(designer_id)))]
	pub async fn create_design(
		&self,
		designer_id: &str,
		request: CreateDesignRequest,
	) -> Result<Design, StoreError> {
		if request.name.trim().is_empty() {
			return Err(ValidationError::MissingField("name").into());
		}
		let design = Design {
			id: uuid::Uuid::new_v4().to_string(),
			designer_id: designer_id.to_string(),
			name: request.name,
			category: request.category,
			status: String::new(),
			tech_pack_ref: request.tech_pack_ref.filter(|r| !r.trim().is_empty()),
			created_at: Utc::now(),
		};
		self.storage
			.store(StorageKey::Designs.as_str(), &design.id, &design)
			.await
			.map_err(storage_err)?;
		self.storage
			.store(
				StorageKey::DesignsByDesigner.as_str(),
				&format!("{}:{}", design.designer_id, design.id),
				&design.id,
			)
			.await
			.map_err(storage_err)?;

		tracing::info!(design_id = %truncate_id(&design.id), "Design created");
		Ok(design)
	}

	/// The calling designer's designs, newest first.
	pub async fn list_designs_for_designer(&self, actor: &Actor) -> Result<Vec<Design>, StoreError> {
		if actor.role != Role::Designer {
			return Err(OwnershipError::WrongRole {
				expected: Role::Designer,
				actual: actor.role,
			}
			.into());
		}
		let ids: Vec<String> = self
			.storage
			.retrieve_all(
				StorageKey::DesignsByDesigner.as_str(),
				&format!("{}:", actor.id),
			)
			.await
			.map_err(storage_err)?;

		let mut designs = Vec::with_capacity(ids.len());
		for id in ids {
			designs.push(self.read_design(&id).await?);
		}
		designs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(designs)
	}

	pub async fn read_design(&self, design_id: &str) -> Result<Design, StoreError> {
		self.storage
			.retrieve(StorageKey::Designs.as_str(), design_id)
			.await
			.map_err(not_found("design", design_id))
	}

	async fn owned_design(&self, actor: &Actor, design_id: &str) -> Result<Design, StoreError> {
		let design = self.read_design(design_id).await?;
		if actor.role != Role::Designer || actor.id != design.designer_id {
			return Err(OwnershipError::NotDesignOwner.into());
		}
		Ok(design)
	}

	/// Records the tech-pack reference on a design.
	#[instrument(skip_all, fields(design_id = %truncate_id(design_id)))]
	pub async fn attach_tech_pack(
		&self,
		actor: &Actor,
		design_id: &str,
		tech_pack_ref: &str,
	) -> Result<Design, StoreError> {
		if tech_pack_ref.trim().is_empty() {
			return Err(ValidationError::MissingField("tech_pack_ref").into());
		}
		let design = {
			let _guard = self.locks.lock(&format!("design:{}", design_id)).await;
			let mut design = self.owned_design(actor, design_id).await?;
			design.tech_pack_ref = Some(tech_pack_ref.to_string());
			self.storage
				.update(StorageKey::Designs.as_str(), design_id, &design)
				.await
				.map_err(storage_err)?;
			design
		};

		self.event_bus
			.publish(WorkflowEvent::Design(DesignEvent::Updated {
				design: design.clone(),
			}));
		self.refresh_order_status(design_id, Role::Designer).await;
		Ok(design)
	}

	/// Overwrites the display status mirror of a design.
	pub async fn update_design_status(
		&self,
		design_id: &str,
		status: &str,
	) -> Result<Design, StoreError> {
		let (design, changed) = {
			let _guard = self.locks.lock(&format!("design:{}", design_id)).await;
			let mut design = self.read_design(design_id).await?;
			let changed = design.status != status;
			if changed {
				design.status = status.to_string();
				self.storage
					.update(StorageKey::Designs.as_str(), design_id, &design)
					.await
					.map_err(storage_err)?;
			}
			(design, changed)
		};
		if changed {
			self.event_bus
				.publish(WorkflowEvent::Design(DesignEvent::Updated {
					design: design.clone(),
				}));
		}
		Ok(design)
	}

	// manufacturers

	pub async fn register_manufacturer(
		&self,
		profile: ManufacturerProfile,
	) -> Result<ManufacturerProfile, StoreError> {
		if profile.id.trim().is_empty() {
			return Err(ValidationError::MissingField("id").into());
		}
		if profile.name.trim().is_empty() {
			return Err(ValidationError::MissingField("name").into());
		}
		self.storage
			.store(StorageKey::Manufacturers.as_str(), &profile.id, &profile)
			.await
			.map_err(storage_err)?;
		tracing::info!(manufacturer_id = %truncate_id(&profile.id), "Manufacturer registered");
		Ok(profile)
	}

	pub async fn read_manufacturer(
		&self,
		manufacturer_id: &str,
	) -> Result<ManufacturerProfile, StoreError> {
		self.storage
			.retrieve(StorageKey::Manufacturers.as_str(), manufacturer_id)
			.await
			.map_err(not_found("manufacturer", manufacturer_id))
	}

	// orders

	/// Creates the order for a design, or returns the one that already exists.
	#[instrument(skip_all, fields(design_id = %truncate_id(design_id)))]
	pub async fn create_order(
		&self,
		actor: &Actor,
		design_id: &str,
		quantity: Option<u32>,
	) -> Result<Order, StoreError> {
		let design = self.owned_design(actor, design_id).await?;
		if quantity == Some(0) {
			return Err(ValidationError::InvalidQuantity.into());
		}
		if let Some(existing) = self.find_order_for_design(design_id).await? {
			return Ok(existing);
		}

		let now = Utc::now();
		let mut order = Order::new(
			uuid::Uuid::new_v4().to_string(),
			design_id,
			&design.designer_id,
			now,
		);
		order.quantity = quantity;
		let matches = self.matches.list(design_id).await?;
		let snapshot = WorkflowSnapshot {
			design,
			order,
			matches,
		};
		let mut order = snapshot.order.clone();
		order.status = mirror_status(&snapshot);

		self.orders.store_order(&order).await?;
		let won = self
			.storage
			.store_if_absent(StorageKey::OrderByDesign.as_str(), design_id, &order.id)
			.await
			.map_err(storage_err)?;
		if !won {
			self.storage
				.remove(StorageKey::Orders.as_str(), &order.id)
				.await
				.map_err(storage_err)?;
			return self
				.find_order_for_design(design_id)
				.await?
				.ok_or_else(|| StoreError::NotFound(format!("order for design {}", design_id)));
		}

		tracing::info!(order_id = %truncate_id(&order.id), "Order created");
		self.event_bus
			.publish(WorkflowEvent::Order(OrderEvent::Created {
				order: order.clone(),
			}));
		Ok(order)
	}

	pub async fn find_order_for_design(&self, design_id: &str) -> Result<Option<Order>, StoreError> {
		let order_id: Option<String> = self
			.storage
			.try_retrieve(StorageKey::OrderByDesign.as_str(), design_id)
			.await
			.map_err(storage_err)?;
		match order_id {
			Some(id) => Ok(Some(self.read_order(&id).await?)),
			None => Ok(None),
		}
	}

	/// Orders of the calling designer's designs, newest first.
	pub async fn list_orders_for_designer(&self, actor: &Actor) -> Result<Vec<Order>, StoreError> {
		let mut orders = Vec::new();
		for design in self.list_designs_for_designer(actor).await? {
			if let Some(order) = self.find_order_for_design(&design.id).await? {
				orders.push(order);
			}
		}
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	/// Orders currently bound to the calling manufacturer, newest first.
	///
	/// Binding requires an accepted match, so the manufacturer's accepted
	/// matches bound the search.
	pub async fn list_orders_for_manufacturer(&self, actor: &Actor) -> Result<Vec<Order>, StoreError> {
		let mut orders = Vec::new();
		for record in self.list_matches_for_manufacturer(actor).await? {
			if record.status != MatchStatus::Accepted {
				continue;
			}
			let Some(order) = self.find_order_for_design(&record.design_id).await? else {
				continue;
			};
			if order.manufacturer_id.as_deref() == Some(actor.id.as_str()) {
				orders.push(order);
			}
		}
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		Ok(orders)
	}

	pub async fn read_order(&self, order_id: &str) -> Result<Order, StoreError> {
		Ok(self.orders.get_order(order_id).await?)
	}

	/// One consistent read of everything the resolver needs.
	pub async fn snapshot(&self, order_id: &str) -> Result<WorkflowSnapshot, StoreError> {
		let order = self.read_order(order_id).await?;
		let design = self.read_design(&order.design_id).await?;
		let matches = self.matches.list(&order.design_id).await?;
		Ok(WorkflowSnapshot {
			design,
			order,
			matches,
		})
	}

	/// Applies a role-scoped partial update and publishes the new order.
	///
	/// All fields of the patch are accepted or none are; on any error nothing
	/// is written and nothing is published.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), role = %actor.role))]
	pub async fn write_order_fields(
		&self,
		actor: &Actor,
		order_id: &str,
		patch: OrderPatch,
	) -> Result<Order, StoreError> {
		let current = self.read_order(order_id).await?;
		let design = self.read_design(&current.design_id).await?;
		let matches = self.matches.list(&current.design_id).await?;
		let now = Utc::now();

		let (before, after) = self
			.orders
			.update_order_with(order_id, |order| {
				let snapshot = WorkflowSnapshot {
					design,
					order: order.clone(),
					matches,
				};
				apply_patch(&snapshot, actor, &patch, now)
			})
			.await
			.map_err(|e| {
				tracing::debug!(error = %e, "Order write refused");
				StoreError::from(e)
			})?;

		let changed = changed_fields(&before, &after);
		tracing::info!(fields = ?changed, status = %after.status, "Order updated");
		self.event_bus
			.publish(WorkflowEvent::Order(OrderEvent::Changed {
				order: after.clone(),
				changed_fields: changed,
				writer: actor.role,
			}));
		Ok(after)
	}

	/// Recomputes the status mirror after a design or match change.
	///
	/// The triggering write has already landed and the mirror is display only,
	/// so a failure here is logged rather than returned.
	async fn refresh_order_status(&self, design_id: &str, writer: Role) {
		if let Err(e) = self.try_refresh_order_status(design_id, writer).await {
			tracing::warn!(
				design_id = %truncate_id(design_id),
				error = %e,
				"Order status mirror not refreshed"
			);
		}
	}

	async fn try_refresh_order_status(&self, design_id: &str, writer: Role) -> Result<(), StoreError> {
		let Some(current) = self.find_order_for_design(design_id).await? else {
			return Ok(());
		};
		let design = self.read_design(design_id).await?;
		let matches = self.matches.list(design_id).await?;
		let now = Utc::now();

		let (before, after) = self
			.orders
			.update_order_with(&current.id, |order| {
				let snapshot = WorkflowSnapshot {
					design,
					order: order.clone(),
					matches,
				};
				let mut updated = order.clone();
				updated.status = mirror_status(&snapshot);
				if updated.status != order.status {
					updated.updated_at = now;
				}
				Ok(updated)
			})
			.await?;

		if before.status != after.status {
			self.event_bus
				.publish(WorkflowEvent::Order(OrderEvent::Changed {
					changed_fields: changed_fields(&before, &after),
					order: after,
					writer,
				}));
		}
		Ok(())
	}

	pub async fn subscribe_order_changes(
		&self,
		order_id: &str,
	) -> Result<OrderSubscription, StoreError> {
		// Subscribe before the existence check so nothing published after it is missed
		let receiver = self.event_bus.subscribe();
		let order = self.read_order(order_id).await?;
		Ok(OrderSubscription::new(order.id, order.design_id, receiver))
	}

	// matches

	#[instrument(skip_all, fields(design_id = %truncate_id(design_id), manufacturer_id = %truncate_id(manufacturer_id)))]
	pub async fn create_match_if_absent(
		&self,
		design_id: &str,
		manufacturer_id: &str,
		score: f64,
	) -> Result<ManufacturerMatch, StoreError> {
		self.read_design(design_id).await?;
		let (record, created) = self
			.matches
			.create_if_absent(design_id, manufacturer_id, score.clamp(0.0, 100.0), Utc::now())
			.await?;

		if created {
			tracing::info!(match_id = %truncate_id(&record.id), score = record.score, "Match requested");
			self.event_bus
				.publish(WorkflowEvent::Match(MatchEvent::Created {
					record: record.clone(),
				}));
			self.refresh_order_status(design_id, Role::Designer).await;
		}
		Ok(record)
	}

	pub async fn list_matches(&self, design_id: &str) -> Result<Vec<ManufacturerMatch>, StoreError> {
		Ok(self.matches.list(design_id).await?)
	}

	/// A design's matches as `actor` may see them, best score first.
	///
	/// The owning designer sees every candidate; a manufacturer sees only its
	/// own request.
	pub async fn list_matches_for(
		&self,
		actor: &Actor,
		design_id: &str,
	) -> Result<Vec<ManufacturerMatch>, StoreError> {
		let design = self.read_design(design_id).await?;
		let mut records = self.matches.list(design_id).await?;
		match actor.role {
			Role::Designer if actor.id == design.designer_id => {},
			Role::Designer => return Err(OwnershipError::NotDesignOwner.into()),
			Role::Manufacturer => {
				records.retain(|m| m.manufacturer_id == actor.id);
				if records.is_empty() {
					return Err(OwnershipError::NotDesignParty.into());
				}
			},
		}
		records.sort_by(|a, b| b.score.total_cmp(&a.score));
		Ok(records)
	}

	/// Match requests addressed to the calling manufacturer, newest first.
	pub async fn list_matches_for_manufacturer(
		&self,
		actor: &Actor,
	) -> Result<Vec<ManufacturerMatch>, StoreError> {
		if actor.role != Role::Manufacturer {
			return Err(OwnershipError::WrongRole {
				expected: Role::Manufacturer,
				actual: actor.role,
			}
			.into());
		}
		Ok(self.matches.list_for_manufacturer(&actor.id).await?)
	}

	#[instrument(skip_all, fields(match_id = %truncate_id(match_id), status = %status))]
	pub async fn update_match_status(
		&self,
		actor: &Actor,
		match_id: &str,
		status: MatchStatus,
	) -> Result<ManufacturerMatch, StoreError> {
		let update = self
			.matches
			.update_status(actor, match_id, status, Utc::now())
			.await?;

		if update.changed {
			tracing::info!(design_id = %truncate_id(&update.record.design_id), "Match answered");
			self.event_bus
				.publish(WorkflowEvent::Match(MatchEvent::StatusChanged {
					record: update.record.clone(),
				}));
			self.refresh_order_status(&update.record.design_id, Role::Manufacturer)
				.await;
		}
		Ok(update.record)
	}

	/// Scores each selected manufacturer and records a match request for it.
	///
	/// Returns the design's matches for the selection, best score first.
	#[instrument(skip_all, fields(design_id = %truncate_id(design_id)))]
	pub async fn send_requests(
		&self,
		actor: &Actor,
		design_id: &str,
		manufacturer_ids: &[String],
		requirements: &DesignRequirements,
	) -> Result<Vec<ManufacturerMatch>, StoreError> {
		let design = self.owned_design(actor, design_id).await?;
		if design.tech_pack_ref.is_none() {
			return Err(ValidationError::MissingTechPack.into());
		}

		let mut seen = HashSet::new();
		let selected: Vec<&String> = manufacturer_ids
			.iter()
			.filter(|id| !id.trim().is_empty() && seen.insert(id.as_str()))
			.collect();
		if selected.is_empty() {
			return Err(ValidationError::NoManufacturersSelected.into());
		}
		if selected.len() > self.max_requests {
			return Err(ValidationError::TooManyRequests {
				max: self.max_requests,
			}
			.into());
		}

		// Resolve every profile before writing anything
		let mut profiles = Vec::with_capacity(selected.len());
		for id in selected {
			profiles.push(self.read_manufacturer(id).await?);
		}

		let mut records = Vec::with_capacity(profiles.len());
		for profile in &profiles {
			let score = self.scorer.score(requirements, profile);
			records.push(
				self.create_match_if_absent(design_id, &profile.id, score)
					.await?,
			);
		}
		records.sort_by(|a, b| b.score.total_cmp(&a.score));

		tracing::info!(count = records.len(), "Match requests sent");
		Ok(records)
	}

	// messages

	/// Appends a message to an order's thread.
	///
	/// The sender must be the order's designer or a manufacturer that can see
	/// the order.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), role = %sender.role))]
	pub async fn append_message(
		&self,
		order_id: &str,
		sender: &Actor,
		content: &str,
		attachments: Vec<String>,
	) -> Result<Message, StoreError> {
		if content.trim().is_empty() && attachments.is_empty() {
			return Err(ValidationError::MissingField("content").into());
		}
		let snapshot = self.snapshot(order_id).await?;
		let is_party = match sender.role {
			Role::Designer => sender.id == snapshot.order.designer_id,
			Role::Manufacturer => resolver::manufacturer_eligibility(&sender.id, &snapshot).is_ok(),
		};
		if !is_party {
			return Err(OwnershipError::NotOrderParty.into());
		}

		let message = {
			let _guard = self.locks.lock(&format!("messages:{}", order_id)).await;
			let seq = self.list_messages(order_id).await?.len() as u64 + 1;
			let message = Message {
				id: uuid::Uuid::new_v4().to_string(),
				order_id: order_id.to_string(),
				seq,
				sender_role: sender.role,
				sender_id: sender.id.clone(),
				content: content.to_string(),
				attachments,
				created_at: Utc::now(),
			};
			self.storage
				.store(
					StorageKey::Messages.as_str(),
					&format!("{}:{:012}", order_id, seq),
					&message,
				)
				.await
				.map_err(storage_err)?;
			message
		};

		self.event_bus
			.publish(WorkflowEvent::Message(MessageEvent::Appended {
				message: message.clone(),
			}));
		Ok(message)
	}

	/// Messages of an order ordered by creation time, then sequence number.
	pub async fn list_messages(&self, order_id: &str) -> Result<Vec<Message>, StoreError> {
		let mut messages: Vec<Message> = self
			.storage
			.retrieve_all(StorageKey::Messages.as_str(), &format!("{}:", order_id))
			.await
			.map_err(storage_err)?;
		messages.sort_by_key(|m| m.sort_key());
		Ok(messages)
	}

	pub async fn subscribe_messages(&self, order_id: &str) -> Result<MessageSubscription, StoreError> {
		let receiver = self.event_bus.subscribe();
		let order = self.read_order(order_id).await?;
		Ok(MessageSubscription::new(order.id, receiver))
	}

	// workflow

	/// Current stage and permitted actions for `actor` on an order.
	pub async fn resolve(&self, actor: &Actor, order_id: &str) -> Result<Resolution, StoreError> {
		let snapshot = self.snapshot(order_id).await?;
		let view = authorize_view(actor, &snapshot)?;
		Ok(resolver::resolve(&view, &snapshot)?)
	}

	/// Gate check for leaving `stage_id` in the actor's stage list.
	///
	/// Returns the stage being left and the one that follows it.
	pub async fn check_advance(
		&self,
		actor: &Actor,
		order_id: &str,
		stage_id: &str,
	) -> Result<(Stage, Option<Stage>), StoreError> {
		let stage = Stage::parse(actor.role, stage_id)
			.map_err(|e| ValidationError::Malformed(e.to_string()))?;
		let snapshot = self.snapshot(order_id).await?;
		let view = authorize_view(actor, &snapshot)?;
		workflow::check_open(&view, stage, &snapshot)?;
		workflow::check_advance(&view, stage, &snapshot)?;
		Ok((stage, stage.next()))
	}
}

/// The view `actor` is entitled to on the order in `snapshot`.
///
/// A designer must own the order; a manufacturer must pass the eligibility
/// check, which fails once the order is bound to someone else.
pub fn authorize_view(actor: &Actor, snapshot: &WorkflowSnapshot) -> Result<RoleView, StoreError> {
	match actor.role {
		Role::Designer if actor.id != snapshot.order.designer_id => {
			return Err(OwnershipError::NotDesignOwner.into());
		},
		Role::Designer => {},
		Role::Manufacturer => {
			resolver::manufacturer_eligibility(&actor.id, snapshot)?;
		},
	}
	Ok(RoleView::from(actor))
}
