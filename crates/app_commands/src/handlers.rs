//! Command handlers
//!
//! `CommandHandlers` orchestrates the aggregates against the storage ports.
//! Every handler follows the same shape: validate input, load, run the
//! domain operation, drain pending events, commit through the port's atomic
//! method, then dispatch the drained events to the notification sink.
//! Dispatch is best-effort; a sink failure is logged and swallowed so a
//! committed command never reports failure.
//!
//! Assign-Points and Redeem-Coupon are wrapped in the
//! [`IdempotencyGuard`](crate::idempotency::IdempotencyGuard): retrying
//! either with an identical payload replays the recorded receipt instead of
//! touching the domain again.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use core_kernel::{
    AssignmentId, CardNumber, Clock, CouponId, CustomerId, LedgerEntryId, Money, OperatorId,
    StoreId, ValidityWindow,
};
use domain_coupon::{
    AssignmentReason, Coupon, CouponAssignment, CouponBuilder, CouponEvent, Discount,
};
use domain_loyalty::{points_for, LedgerEntry, LedgerEntryKind, LoyaltyAccount, Tier};

use crate::error::CommandError;
use crate::idempotency::{CommandHash, IdempotencyGuard, IdempotencyRecord};
use crate::ports::{
    CouponStore, IdempotencyStore, LoyaltyStore, Notification, NotificationSink, StoreDirectory,
};

/// Registers a new loyalty customer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCustomerCommand {
    /// Card number in `PREFIX + 9 digits` form
    #[validate(length(min = 10, max = 16))]
    pub card_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterCustomerReceipt {
    pub customer_id: CustomerId,
    pub card_number: CardNumber,
    pub tier: Tier,
}

/// Awards points for a purchase
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignPointsCommand {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    /// Purchase amount the award is computed from
    pub amount: Money,
    pub operator_id: Option<OperatorId>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignPointsReceipt {
    /// The ledger entry recording this accrual
    pub transaction_id: LedgerEntryId,
    pub points_awarded: i64,
    pub new_balance: i64,
    /// Present only when this accrual raised the tier
    pub new_tier: Option<Tier>,
}

/// Creates a coupon offer, fanning grants out to eligible customers
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCouponCommand {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub discount: Discount,
    pub valid_from: chrono::DateTime<chrono::Utc>,
    pub valid_until: chrono::DateTime<chrono::Utc>,
    pub active: bool,
    pub min_order: Option<Money>,
    pub global_cap: Option<u32>,
    pub per_customer_cap: Option<u32>,
    pub min_tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCouponReceipt {
    pub coupon_id: CouponId,
    /// Number of automatic grants created by the fan-out
    pub assignments_created: u32,
}

/// Grants one coupon instance to one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignCouponCommand {
    pub coupon_id: CouponId,
    pub customer_id: CustomerId,
    pub reason: AssignmentReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignCouponReceipt {
    pub assignment_id: AssignmentId,
}

/// Redeems a granted coupon at a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemCouponCommand {
    pub assignment_id: AssignmentId,
    pub operator_id: OperatorId,
    pub store_id: StoreId,
    /// Required when the coupon carries a minimum order amount
    pub order_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedeemCouponReceipt {
    pub assignment_id: AssignmentId,
    pub coupon_id: CouponId,
    /// Discount computed from the order amount, when one was supplied
    pub discount: Option<Money>,
    pub redeemed_at: chrono::DateTime<chrono::Utc>,
}

/// Orchestrates commands against the storage and notification ports
pub struct CommandHandlers {
    loyalty: Arc<dyn LoyaltyStore>,
    coupons: Arc<dyn CouponStore>,
    directory: Arc<dyn StoreDirectory>,
    sink: Arc<dyn NotificationSink>,
    guard: IdempotencyGuard,
    clock: Arc<dyn Clock>,
}

impl CommandHandlers {
    pub fn new(
        loyalty: Arc<dyn LoyaltyStore>,
        coupons: Arc<dyn CouponStore>,
        directory: Arc<dyn StoreDirectory>,
        idempotency: Arc<dyn IdempotencyStore>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let guard = IdempotencyGuard::new(idempotency);
        CommandHandlers {
            loyalty,
            coupons,
            directory,
            sink,
            guard,
            clock,
        }
    }

    /// Opens a new loyalty account
    pub async fn register_customer(
        &self,
        command: RegisterCustomerCommand,
    ) -> Result<RegisterCustomerReceipt, CommandError> {
        validate(&command)?;
        let card_number = command
            .card_number
            .parse::<CardNumber>()
            .map_err(|e| CommandError::invalid_argument(e.to_string()))?;

        let account = LoyaltyAccount::open(card_number, self.clock.now());
        self.loyalty.insert_account(&account).await?;

        info!(customer_id = %account.id(), "Customer registered");
        Ok(RegisterCustomerReceipt {
            customer_id: account.id(),
            card_number: account.card_number().clone(),
            tier: account.tier(),
        })
    }

    /// Awards points for a purchase, idempotently
    pub async fn assign_points(
        &self,
        command: AssignPointsCommand,
    ) -> Result<AssignPointsReceipt, CommandError> {
        validate(&command)?;
        self.guard
            .execute("assign_points", &command, |hash| {
                self.assign_points_uncached(&command, hash)
            })
            .await
    }

    async fn assign_points_uncached(
        &self,
        command: &AssignPointsCommand,
        hash: CommandHash,
    ) -> Result<AssignPointsReceipt, CommandError> {
        if !command.amount.is_positive() {
            return Err(CommandError::invalid_argument(format!(
                "purchase amount must be positive, got {}",
                command.amount
            )));
        }

        let mut account = self
            .loyalty
            .find_account(command.customer_id)
            .await?
            .filter(LoyaltyAccount::is_active)
            .ok_or_else(|| CommandError::not_found("LoyaltyAccount", command.customer_id))?;

        let rate = self
            .directory
            .conversion_rate(command.store_id)
            .await?
            .ok_or_else(|| CommandError::not_found("Store", command.store_id))?;

        let points = points_for(&command.amount, rate);
        if points == 0 {
            return Err(CommandError::invalid_argument(format!(
                "amount {} yields no points at rate {}",
                command.amount, rate
            )));
        }

        let now = self.clock.now();
        let entry = LedgerEntry::new(
            account.id(),
            command.store_id,
            command.operator_id,
            command.amount,
            points,
            LedgerEntryKind::Accrual,
            command.note.clone(),
            now,
        );

        let tier_before = account.tier();
        account.add_points(points, entry.id(), now)?;
        let events = account.take_events();

        let receipt = AssignPointsReceipt {
            transaction_id: entry.id(),
            points_awarded: points,
            new_balance: account.available(),
            new_tier: (account.tier() > tier_before).then_some(account.tier()),
        };
        let record = IdempotencyRecord::new(
            hash,
            "assign_points",
            serde_json::to_value(&receipt)?,
            now,
        );

        self.loyalty.commit_accrual(&account, &entry, &record).await?;
        self.dispatch(events.into_iter().map(Notification::Loyalty))
            .await;

        info!(
            customer_id = %account.id(),
            points,
            balance = account.available(),
            "Points assigned"
        );
        Ok(receipt)
    }

    /// Creates a coupon and fans out grants to eligible active customers
    pub async fn create_coupon(
        &self,
        command: CreateCouponCommand,
    ) -> Result<CreateCouponReceipt, CommandError> {
        validate(&command)?;
        let now = self.clock.now();

        let validity = ValidityWindow::new(command.valid_from, command.valid_until)
            .map_err(|e| CommandError::invalid_argument(e.to_string()))?;

        let mut builder = CouponBuilder::new(
            command.code.as_str(),
            command.title.as_str(),
            command.discount,
            validity,
        )
        .active(command.active);
        if let Some(description) = &command.description {
            builder = builder.description(description.as_str());
        }
        if let Some(min_order) = command.min_order {
            builder = builder.min_order(min_order);
        }
        if let Some(cap) = command.global_cap {
            builder = builder.global_cap(cap);
        }
        if let Some(cap) = command.per_customer_cap {
            builder = builder.per_customer_cap(cap);
        }
        if let Some(tier) = command.min_tier {
            builder = builder.min_tier(tier);
        }
        let coupon = builder.build(now)?;

        self.coupons.insert_coupon(&coupon).await?;
        self.dispatch(std::iter::once(Notification::Coupon(
            CouponEvent::CouponCreated {
                coupon_id: coupon.id(),
                code: coupon.code().to_string(),
                timestamp: now,
            },
        )))
        .await;

        let assignments_created = if coupon.is_valid(now) {
            self.fan_out(&coupon).await?
        } else {
            0
        };

        info!(
            coupon_id = %coupon.id(),
            code = coupon.code(),
            assignments_created,
            "Coupon created"
        );
        Ok(CreateCouponReceipt {
            coupon_id: coupon.id(),
            assignments_created,
        })
    }

    /// Grants one coupon instance to each eligible active customer
    ///
    /// Each grant is independent: a failure for one customer is logged and
    /// the fan-out continues.
    async fn fan_out(&self, coupon: &Coupon) -> Result<u32, CommandError> {
        let now = self.clock.now();
        let mut created = 0u32;

        for account in self.loyalty.active_accounts().await? {
            let result = self.fan_out_one(coupon, &account, now).await;
            match result {
                Ok(true) => created += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        coupon_id = %coupon.id(),
                        customer_id = %account.id(),
                        error = %err,
                        "Fan-out grant failed; continuing"
                    );
                }
            }
        }
        Ok(created)
    }

    async fn fan_out_one(
        &self,
        coupon: &Coupon,
        account: &LoyaltyAccount,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, CommandError> {
        let prior = self
            .coupons
            .assignment_count(coupon.id(), account.id())
            .await?;
        if !coupon.is_eligible_for(account.tier(), prior, now) {
            return Ok(false);
        }
        if self
            .coupons
            .live_assignment_exists(coupon.id(), account.id())
            .await?
        {
            return Ok(false);
        }

        let assignment =
            CouponAssignment::new(coupon.id(), account.id(), AssignmentReason::Automatic, now);
        self.coupons.insert_assignment(&assignment).await?;
        self.dispatch(std::iter::once(Notification::Coupon(
            CouponEvent::CouponAssigned {
                assignment_id: assignment.id(),
                coupon_id: coupon.id(),
                customer_id: account.id(),
                reason: AssignmentReason::Automatic,
                timestamp: now,
            },
        )))
        .await;
        Ok(true)
    }

    /// Grants one coupon instance to one customer
    pub async fn assign_coupon(
        &self,
        command: AssignCouponCommand,
    ) -> Result<AssignCouponReceipt, CommandError> {
        let now = self.clock.now();

        let coupon = self
            .coupons
            .find_coupon(command.coupon_id)
            .await?
            .ok_or_else(|| CommandError::not_found("Coupon", command.coupon_id))?;
        coupon.ensure_valid(now)?;

        let account = self
            .loyalty
            .find_account(command.customer_id)
            .await?
            .filter(LoyaltyAccount::is_active)
            .ok_or_else(|| CommandError::not_found("LoyaltyAccount", command.customer_id))?;

        if self
            .coupons
            .live_assignment_exists(coupon.id(), account.id())
            .await?
        {
            return Err(CommandError::conflict(format!(
                "Customer {} already holds an unredeemed grant of coupon {}",
                account.id(),
                coupon.id()
            )));
        }

        let prior = self
            .coupons
            .assignment_count(coupon.id(), account.id())
            .await?;
        coupon.ensure_eligible_for(account.tier(), prior, now)?;

        let assignment = CouponAssignment::new(coupon.id(), account.id(), command.reason, now);
        self.coupons.insert_assignment(&assignment).await?;
        self.dispatch(std::iter::once(Notification::Coupon(
            CouponEvent::CouponAssigned {
                assignment_id: assignment.id(),
                coupon_id: coupon.id(),
                customer_id: account.id(),
                reason: command.reason,
                timestamp: now,
            },
        )))
        .await;

        info!(
            assignment_id = %assignment.id(),
            coupon_id = %coupon.id(),
            customer_id = %account.id(),
            "Coupon assigned"
        );
        Ok(AssignCouponReceipt {
            assignment_id: assignment.id(),
        })
    }

    /// Redeems a granted coupon, idempotently
    pub async fn redeem_coupon(
        &self,
        command: RedeemCouponCommand,
    ) -> Result<RedeemCouponReceipt, CommandError> {
        self.guard
            .execute("redeem_coupon", &command, |hash| {
                self.redeem_coupon_uncached(&command, hash)
            })
            .await
    }

    async fn redeem_coupon_uncached(
        &self,
        command: &RedeemCouponCommand,
        hash: CommandHash,
    ) -> Result<RedeemCouponReceipt, CommandError> {
        let now = self.clock.now();

        let mut assignment = self
            .coupons
            .find_assignment(command.assignment_id)
            .await?
            .ok_or_else(|| CommandError::not_found("CouponAssignment", command.assignment_id))?;
        if assignment.is_redeemed() {
            return Err(CommandError::AlreadyRedeemed);
        }

        let mut coupon = self
            .coupons
            .find_coupon(assignment.coupon_id())
            .await?
            .ok_or_else(|| CommandError::not_found("Coupon", assignment.coupon_id()))?;
        // Validity is re-checked at redemption time: a coupon that expired
        // or was deactivated after the grant cannot be used.
        coupon.ensure_valid(now)?;
        coupon.ensure_minimum_met(command.order_amount)?;

        assignment.redeem(command.operator_id, command.store_id, now)?;
        coupon.increment_usage(now)?;

        let receipt = RedeemCouponReceipt {
            assignment_id: assignment.id(),
            coupon_id: coupon.id(),
            discount: command.order_amount.map(|order| coupon.compute_discount(order)),
            redeemed_at: now,
        };
        let record = IdempotencyRecord::new(
            hash,
            "redeem_coupon",
            serde_json::to_value(&receipt)?,
            now,
        );

        self.coupons
            .commit_redemption(&assignment, &coupon, &record)
            .await?;
        self.dispatch(std::iter::once(Notification::Coupon(
            CouponEvent::CouponRedeemed {
                assignment_id: assignment.id(),
                coupon_id: coupon.id(),
                customer_id: assignment.customer_id(),
                operator_id: command.operator_id,
                store_id: command.store_id,
                timestamp: now,
            },
        )))
        .await;

        info!(
            assignment_id = %assignment.id(),
            coupon_id = %coupon.id(),
            store_id = %command.store_id,
            "Coupon redeemed"
        );
        Ok(receipt)
    }

    async fn dispatch(&self, notifications: impl Iterator<Item = Notification>) {
        for notification in notifications {
            if let Err(err) = self.sink.deliver(notification.clone()).await {
                warn!(
                    event_type = notification.event_type(),
                    error = %err,
                    "Notification delivery failed; event dropped"
                );
            }
        }
    }
}

fn validate<T: Validate>(command: &T) -> Result<(), CommandError> {
    command
        .validate()
        .map_err(|e| CommandError::invalid_argument(e.to_string()))
}
