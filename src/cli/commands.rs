// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::{ArgGroup, Args};
use rust_decimal::Decimal;
use tracing::debug;

use super::client::LedgerClient;
use crate::api::{
    CommissionResponse, RecordCommissionRequest, RegisterAffiliateRequest, ReleaseResponse,
    WithdrawalRequestBody, WithdrawalResponse,
};
use crate::ledger::{AffiliateStats, AffiliateSummary, RecentCommission};

/// Arguments for register command
#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Affiliate identifier
    #[arg(long)]
    pub affiliate: String,

    /// Commission percentage (server default when omitted)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Paying customers needed to unlock commissions (server default when omitted)
    #[arg(long)]
    pub threshold: Option<u32>,
}

/// Arguments for commands that only need an affiliate
#[derive(Args, Debug)]
pub struct AffiliateArgs {
    /// Affiliate identifier
    #[arg(long)]
    pub affiliate: String,
}

/// Arguments for record command
#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("value")
        .required(true)
        .args(["amount", "payment_amount"]),
))]
pub struct RecordArgs {
    #[arg(long)]
    pub affiliate: String,

    /// Referred customer identifier
    #[arg(long)]
    pub customer: String,

    /// Commission amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Customer payment; commission is derived from the affiliate's rate
    #[arg(long)]
    pub payment_amount: Option<Decimal>,
}

/// Arguments for withdraw command
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    #[arg(long)]
    pub affiliate: String,

    #[arg(long)]
    pub amount: Decimal,
}

/// Arguments for recent command
#[derive(Args, Debug)]
pub struct RecentArgs {
    #[arg(long)]
    pub affiliate: String,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

pub async fn register(client: &LedgerClient, args: RegisterArgs) -> Result<()> {
    let url = client.endpoint(&["v1", "affiliates"])?;
    let summary: AffiliateSummary = client
        .post(
            url,
            &RegisterAffiliateRequest {
                affiliate_id: args.affiliate,
                commission_rate: args.rate,
                threshold_target: args.threshold,
            },
        )
        .await?;

    println!("✅ Registered affiliate {}", summary.affiliate_id);
    println!("  Commission rate:  {}%", summary.commission_rate);
    println!("  Threshold target: {} paying customers", summary.threshold_target);
    Ok(())
}

pub async fn stats(client: &LedgerClient, args: AffiliateArgs) -> Result<()> {
    let url = client.endpoint(&["v1", "affiliates", &args.affiliate, "stats"])?;
    let stats: AffiliateStats = client.get(url).await?;

    println!("\n📊 Affiliate {}", args.affiliate);
    println!(
        "  Paying customers:   {}/{}",
        stats.paid_customers_count, stats.threshold_target
    );
    println!("  Commission rate:    {}%", stats.commission_rate);
    println!("  Pending (locked):   {}", stats.pending_commission);
    println!("  Released balance:   {}", stats.commission_balance);
    println!("  Total earned:       {}", stats.total_earned);
    if stats.can_withdraw {
        println!("  ✅ Withdrawal available");
    } else if stats.paid_customers_count < stats.threshold_target {
        println!(
            "  🔒 {} more paying customers to unlock",
            stats.threshold_target - stats.paid_customers_count
        );
    } else {
        println!("  Nothing to withdraw");
    }
    Ok(())
}

pub async fn record(client: &LedgerClient, args: RecordArgs) -> Result<()> {
    let url = client.endpoint(&["v1", "affiliates", &args.affiliate, "commissions"])?;
    let event: Option<CommissionResponse> = client
        .post(
            url,
            &RecordCommissionRequest {
                customer_id: args.customer.clone(),
                amount: args.amount,
                payment_amount: args.payment_amount,
            },
        )
        .await?;

    match event {
        Some(event) => println!(
            "✅ Recorded commission {} of {} ({})",
            event.id, event.amount, event.status
        ),
        None => println!(
            "✅ Counted {} as paying; the payment earned no commission",
            args.customer
        ),
    }
    Ok(())
}

pub async fn evaluate(client: &LedgerClient, args: AffiliateArgs) -> Result<()> {
    let url = client.endpoint(&["v1", "affiliates", &args.affiliate, "evaluate"])?;
    let response: ReleaseResponse = client.post(url, &serde_json::json!({})).await?;

    if response.released.is_empty() {
        println!("Nothing released for {}", args.affiliate);
    } else {
        println!(
            "🔓 Released {} commissions for {}",
            response.released.len(),
            args.affiliate
        );
    }
    Ok(())
}

pub async fn withdraw(client: &LedgerClient, args: WithdrawArgs) -> Result<()> {
    let url = client.endpoint(&["v1", "affiliates", &args.affiliate, "withdrawals"])?;
    debug!("Requesting withdrawal of {} at {}", args.amount, url);
    let receipt: WithdrawalResponse = client
        .post(url, &WithdrawalRequestBody { amount: args.amount })
        .await?;

    println!("✅ Withdrawal {}", receipt.id);
    println!("  Requested: {}", receipt.requested_amount);
    println!("  Paid:      {}", receipt.paid_amount);
    println!("  Commissions settled: {}", receipt.event_ids.len());
    match receipt.payment_method {
        Some(method) => println!("  Payout method: {}", method.describe()),
        None => println!("  ⚠️  No payment method on file"),
    }
    Ok(())
}

pub async fn recent(client: &LedgerClient, args: RecentArgs) -> Result<()> {
    let mut url = client.endpoint(&["v1", "affiliates", &args.affiliate, "commissions"])?;
    url.query_pairs_mut()
        .append_pair("limit", &args.limit.to_string());
    let rows: Vec<RecentCommission> = client.get(url).await?;

    if rows.is_empty() {
        println!("No commissions yet for {}", args.affiliate);
        return Ok(());
    }
    for row in rows {
        println!(
            "{}  {:<9} {:>10}  {}",
            row.created_at.format("%Y-%m-%d %H:%M"),
            row.status.as_str(),
            row.amount,
            row.customer_name.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
