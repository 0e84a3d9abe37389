//! Command dispatch.
//!
//! Exactly one side-effecting path runs per inbound event. The dispatcher
//! owns the per-command behavior and failure policy: known transfer
//! failure codes map to specific user guidance, lookup misses fall
//! through to the next strategy, and unknown external failures are logged
//! and swallowed so the end user sees nothing. Every swallowed failure
//! still emits a structured log event.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Local;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::{Uuid, uuid};

use crate::agent::plan::ResponsePlan;
use crate::agent::proposal::{MultisigOwners, Operation};
use crate::agent::router::{self, Command, InboundMessage};
use crate::agent::trace;
use crate::api::{MixinApi, MultisigTransactionRequest, Snapshot, TransferRequest, User};
use crate::error::EncodeError;
use crate::qr;

/// CNB, the asset granted by the daily claim.
const CLAIM_ASSET_ID: Uuid = uuid!("965e5c6e-434c-3fa9-b780-c50f43cd955c");
const CLAIM_AMOUNT: Decimal = dec!(1);
const CLAIM_MEMO: &str = "trainbot daily claim";

/// XIN, the asset carrying the proposal broadcast.
const PROPOSAL_ASSET_ID: Uuid = uuid!("c6d0c728-2624-429b-8e0d-d9d19b6592fa");
const PROPOSAL_AMOUNT: Decimal = dec!(0.0001);
const PROPOSAL_THRESHOLD: u8 = 4;
const PROPOSAL_OBSERVER_KEY: &str =
    "0390dd88700acf900850b9d7760c4ff52b552c586ae8cbe6dcb9b25343eec95c2d";
const PROPOSAL_RECEIVERS: [Uuid; 5] = [
    uuid!("71b72e67-3636-473a-9ee4-db7ba3094057"),
    uuid!("148e696f-f1db-4472-a907-ceea50c5cfde"),
    uuid!("c9a9a719-4679-4057-bcf0-98945ed95a81"),
    uuid!("b45dcee0-23d7-4ad1-b51e-c681a257c13e"),
    uuid!("fcb87491-4fa0-4c2f-b387-262b63cbc112"),
];
const ACCOUNT_URL_BASE: &str = "https://safe.mixin.dev/accounts/";

/// The only identity allowed to broadcast account proposals.
pub const DEFAULT_PROPOSAL_OWNER: Uuid = uuid!("193efbc5-e5df-4a55-9d46-fe1ec4347def");

const COLOR_MINT: &str = "#1DDA99";
const COLOR_CORAL: &str = "#f05d5d";
const COLOR_BLACK: &str = "#000000";

const BTN_CHECK_IN: &str = "check in";
const BTN_DONATE: &str = "donate";

const HELP_TEXT: &str = "1. user lookup: send a user_id or identity_number\n\
    2. asset lookup: send an asset_id or symbol\n\
    3. daily grant of 1 CNB: send /claim or tap check in\n\
    4. donations: send /donate or tap donate";

const MSG_NOT_RECOGNIZED: &str = "input not recognized";
const MSG_ALREADY_CLAIMED: &str = "already claimed today, come back tomorrow";
const MSG_CLAIM_KEY_USED: &str = "claim key already used elsewhere";
const MSG_INSUFFICIENT_BALANCE: &str = "insufficient balance, please donate CNB to refill the pool";
const MSG_PROPOSAL_DENIED: &str = "account proposals are restricted to the bot owner";

/// Static bot identity, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// The bot's own account id; target of donate buttons.
    pub client_id: String,
    pub proposal_owner: Uuid,
}

impl BotConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            proposal_owner: DEFAULT_PROPOSAL_OWNER,
        }
    }

    pub fn with_proposal_owner(mut self, owner: Uuid) -> Self {
        self.proposal_owner = owner;
        self
    }
}

/// Classifies inbound events and turns each into a [`ResponsePlan`].
///
/// Holds no mutable state; safe to share across concurrent event handlers.
pub struct Dispatcher {
    api: Arc<dyn MixinApi>,
    config: BotConfig,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn MixinApi>, config: BotConfig) -> Self {
        Self { api, config }
    }

    /// Handle one inbound event end to end, producing the outbound plan.
    pub async fn dispatch(&self, message: &InboundMessage) -> ResponsePlan {
        let command = router::classify(message);
        debug!(sender = %message.sender_id, ?command, "dispatching command");

        let sender = message.sender_id.as_str();
        match command {
            Command::Help { hint } => self.help_plan(hint),
            Command::Claim => self.handle_claim(sender).await,
            Command::Donate => self.donate_plan(),
            Command::Proposal => self.handle_proposal(sender).await,
            Command::LookupByIdentifier(id) => self.handle_identifier_lookup(id).await,
            Command::LookupByIdentityNumber(number) => {
                self.handle_identity_number_lookup(number).await
            }
            Command::DepositReceived(snapshot) => self.handle_deposit(&snapshot).await,
            Command::Unrecognized(text) => self.handle_symbol_search(&text).await,
        }
    }

    fn help_plan(&self, hint: Option<&str>) -> ResponsePlan {
        let content = match hint {
            Some(hint) => format!("{hint}\n{HELP_TEXT}"),
            None => HELP_TEXT.to_string(),
        };
        ResponsePlan::text(content)
            .with_button(BTN_CHECK_IN, "input:/claim", COLOR_MINT)
            .with_button(BTN_DONATE, "input:/donate", COLOR_CORAL)
    }

    /// Grant today's claim at most once, delegating idempotency to the
    /// remote ledger through the date-scoped trace key.
    async fn handle_claim(&self, sender: &str) -> ResponsePlan {
        let today = Local::now().date_naive();
        let trace_id = trace::claim_trace(sender, today);

        match self.api.read_transfer_by_trace(trace_id).await {
            Ok(Some(prior)) if prior.is_settled() => {
                return ResponsePlan::text(MSG_ALREADY_CLAIMED);
            }
            Ok(Some(_)) => {
                // Granted but not yet settled; stay quiet like the
                // silent-success path.
                debug!(%trace_id, "claim transfer awaiting settlement");
                return ResponsePlan::new();
            }
            Ok(None) => {}
            // A failed probe is not proof of a prior grant. The create
            // below is still safe: the ledger deduplicates on the trace.
            Err(error) => warn!(%trace_id, %error, "claim ledger probe failed"),
        }

        let request = TransferRequest {
            asset_id: CLAIM_ASSET_ID,
            opponent_id: sender.to_string(),
            amount: CLAIM_AMOUNT,
            trace_id,
            memo: CLAIM_MEMO.to_string(),
        };
        match self.api.create_transfer(request).await {
            Ok(transfer) => {
                info!(%trace_id, snapshot_id = ?transfer.snapshot_id, "daily claim granted");
                ResponsePlan::new()
            }
            Err(error) if error.is_duplicate_trace() => ResponsePlan::text(MSG_CLAIM_KEY_USED),
            Err(error) if error.is_insufficient_balance() => {
                ResponsePlan::text(MSG_INSUFFICIENT_BALANCE).with_button(
                    BTN_DONATE,
                    transfer_uri(&self.config.client_id),
                    COLOR_MINT,
                )
            }
            Err(error) => {
                warn!(%trace_id, code = ?error.code(), %error, "claim transfer failed");
                ResponsePlan::new()
            }
        }
    }

    fn donate_plan(&self) -> ResponsePlan {
        ResponsePlan::new().with_button(
            BTN_DONATE,
            transfer_uri(&self.config.client_id),
            COLOR_BLACK,
        )
    }

    /// Broadcast the multisig account proposal. Restricted to the
    /// configured owner; everyone else gets a plain rejection.
    async fn handle_proposal(&self, sender: &str) -> ResponsePlan {
        if sender != self.config.proposal_owner.to_string() {
            warn!(sender, "unauthorized proposal attempt");
            return ResponsePlan::text(MSG_PROPOSAL_DENIED);
        }

        // The operation id doubles as the transaction trace, derived from
        // the caller and the proposal peer so resubmissions deduplicate
        // at the ledger like any other transfer.
        let operation_id = trace::derive_trace(sender, &self.config.proposal_owner.to_string());
        let encoded = match self.encode_proposal(operation_id) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(%operation_id, %err, "proposal encoding failed");
                return ResponsePlan::new();
            }
        };
        let memo = URL_SAFE_NO_PAD.encode(encoded);
        debug!(%operation_id, memo, "broadcasting account proposal");

        let request = MultisigTransactionRequest {
            asset_id: PROPOSAL_ASSET_ID,
            amount: PROPOSAL_AMOUNT,
            trace_id: operation_id,
            memo,
            receivers: PROPOSAL_RECEIVERS.to_vec(),
            threshold: PROPOSAL_THRESHOLD,
        };
        match self.api.create_multisig_transaction(request).await {
            Ok(transaction) => {
                info!(%operation_id, hash = ?transaction.transaction_hash, "account proposal broadcast");
                ResponsePlan::text(format!("curl {ACCOUNT_URL_BASE}{operation_id}"))
            }
            Err(error) => {
                warn!(%operation_id, code = ?error.code(), %error, "proposal broadcast failed");
                ResponsePlan::new()
            }
        }
    }

    fn encode_proposal(&self, operation_id: Uuid) -> Result<Vec<u8>, EncodeError> {
        let extra = MultisigOwners::new(1, vec![self.config.proposal_owner]).encode()?;
        Operation::account_proposal(operation_id, PROPOSAL_OBSERVER_KEY, extra)?.encode()
    }

    /// A 128-bit identifier may name an asset, a user, or both; each
    /// attempt fires independently.
    async fn handle_identifier_lookup(&self, id: Uuid) -> ResponsePlan {
        let mut plan = ResponsePlan::new();
        let mut matched = false;

        match self.api.lookup_asset_by_id(id).await {
            Ok(Some(asset)) => {
                matched = true;
                if let Some(json) = pretty_json(&asset) {
                    plan = plan.with_code_block(json);
                }
            }
            Ok(None) => {}
            Err(error) => warn!(%id, %error, "asset lookup failed"),
        }

        match self.api.lookup_user(&id.to_string()).await {
            Ok(Some(user)) => {
                matched = true;
                plan = self.append_user_card(plan, &user, &id.to_string());
            }
            Ok(None) => {}
            Err(error) => warn!(%id, %error, "user lookup failed"),
        }

        if matched {
            plan
        } else {
            ResponsePlan::text(MSG_NOT_RECOGNIZED)
        }
    }

    async fn handle_identity_number_lookup(&self, number: u64) -> ResponsePlan {
        let queried = number.to_string();
        match self.api.lookup_user(&queried).await {
            Ok(Some(user)) => self.append_user_card(ResponsePlan::new(), &user, &queried),
            Ok(None) => ResponsePlan::text(MSG_NOT_RECOGNIZED),
            Err(error) => {
                warn!(number, %error, "user lookup failed");
                ResponsePlan::text(MSG_NOT_RECOGNIZED)
            }
        }
    }

    /// Contact card, id echo, transfer button, and a QR image of the
    /// transfer URI.
    fn append_user_card(&self, plan: ResponsePlan, user: &User, queried: &str) -> ResponsePlan {
        let mut plan = plan.with_contact_card(&user.user_id);
        if queried != user.user_id {
            plan = plan.with_text(&user.user_id);
        }

        let uri = transfer_uri(&user.user_id);
        plan = plan.with_button(
            format!("transfer to {}", user.full_name),
            &uri,
            COLOR_MINT,
        );
        match qr::transfer_qr(&uri) {
            Ok(image) => plan.with_image(image, qr::QR_MIME_TYPE),
            Err(error) => {
                warn!(user_id = %user.user_id, %error, "transfer qr render failed");
                plan
            }
        }
    }

    async fn handle_symbol_search(&self, query: &str) -> ResponsePlan {
        match self.api.search_assets_by_symbol(query).await {
            Ok(assets) if !assets.is_empty() => {
                let mut plan = ResponsePlan::text(assets[0].asset_id.to_string());
                if let Some(json) = pretty_json(&assets) {
                    plan = plan.with_code_block(json);
                }
                plan
            }
            Ok(_) => ResponsePlan::text(MSG_NOT_RECOGNIZED),
            Err(error) => {
                warn!(query, %error, "asset search failed");
                ResponsePlan::text(MSG_NOT_RECOGNIZED)
            }
        }
    }

    /// Thank the donor, naming the amount and asset symbol.
    async fn handle_deposit(&self, snapshot: &Snapshot) -> ResponsePlan {
        let symbol = match self.api.lookup_asset_by_id(snapshot.asset_id).await {
            Ok(Some(asset)) => asset.symbol,
            Ok(None) => snapshot.asset_id.to_string(),
            Err(error) => {
                warn!(asset_id = %snapshot.asset_id, %error, "deposit asset lookup failed");
                snapshot.asset_id.to_string()
            }
        };
        ResponsePlan::text(format!(
            "received your donation of {} {}, thank you for the support",
            snapshot.amount, symbol
        ))
    }
}

fn transfer_uri(target: &str) -> String {
    format!("mixin://transfer/{target}")
}

fn pretty_json<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Some(json),
        Err(error) => {
            warn!(%error, "json render failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::agent::plan::OutboundAction;
    use crate::api::{ApiError, Asset, Attachment, Transaction, Transfer};

    const CLIENT_ID: &str = "fbd26bc6-3d04-4964-a7fe-a540432b16e2";

    #[derive(Default)]
    struct MockApi {
        users: HashMap<String, User>,
        assets: HashMap<Uuid, Asset>,
        search_results: Vec<Asset>,
        prior_transfer: Option<Transfer>,
        transfer_failure: Option<i64>,
        transfers: Mutex<Vec<TransferRequest>>,
        multisig_requests: Mutex<Vec<MultisigTransactionRequest>>,
    }

    impl MockApi {
        fn with_user(mut self, key: &str, user: User) -> Self {
            self.users.insert(key.to_string(), user);
            self
        }

        fn with_asset(mut self, asset: Asset) -> Self {
            self.assets.insert(asset.asset_id, asset);
            self
        }

        fn remote_error(code: i64) -> ApiError {
            ApiError::Remote {
                status: 202,
                code,
                description: String::new(),
            }
        }
    }

    #[async_trait]
    impl MixinApi for MockApi {
        async fn lookup_user(&self, id: &str) -> Result<Option<User>, ApiError> {
            Ok(self.users.get(id).cloned())
        }

        async fn lookup_asset_by_id(&self, asset_id: Uuid) -> Result<Option<Asset>, ApiError> {
            Ok(self.assets.get(&asset_id).cloned())
        }

        async fn search_assets_by_symbol(&self, _query: &str) -> Result<Vec<Asset>, ApiError> {
            Ok(self.search_results.clone())
        }

        async fn read_transfer_by_trace(
            &self,
            _trace_id: Uuid,
        ) -> Result<Option<Transfer>, ApiError> {
            Ok(self.prior_transfer.clone())
        }

        async fn create_transfer(&self, request: TransferRequest) -> Result<Transfer, ApiError> {
            self.transfers.lock().unwrap().push(request.clone());
            if let Some(code) = self.transfer_failure {
                return Err(Self::remote_error(code));
            }
            Ok(Transfer {
                snapshot_id: Some("b8e4d0c2".to_string()),
                trace_id: request.trace_id,
                asset_id: request.asset_id,
                opponent_id: Some(request.opponent_id),
                amount: request.amount,
                memo: request.memo,
            })
        }

        async fn create_multisig_transaction(
            &self,
            request: MultisigTransactionRequest,
        ) -> Result<Transaction, ApiError> {
            self.multisig_requests.lock().unwrap().push(request);
            Ok(Transaction {
                transaction_hash: Some("d4b1".to_string()),
                snapshot_id: None,
            })
        }

        async fn create_attachment(&self) -> Result<Attachment, ApiError> {
            Ok(Attachment {
                attachment_id: "att-1".to_string(),
                upload_url: "https://upload.example/att-1".to_string(),
            })
        }
    }

    fn dispatcher(api: MockApi) -> (Dispatcher, Arc<MockApi>) {
        let api = Arc::new(api);
        (
            Dispatcher::new(api.clone(), BotConfig::new(CLIENT_ID)),
            api,
        )
    }

    fn sample_user(user_id: &str) -> User {
        User {
            user_id: user_id.to_string(),
            identity_number: "7000103394".to_string(),
            full_name: "Calculator".to_string(),
        }
    }

    fn sample_asset(asset_id: Uuid) -> Asset {
        Asset {
            asset_id,
            chain_id: None,
            symbol: "CNB".to_string(),
            name: "Chui Niu Bi".to_string(),
            icon_url: String::new(),
            price_usd: None,
        }
    }

    async fn dispatch_text(dispatcher: &Dispatcher, sender: &str, content: &str) -> ResponsePlan {
        dispatcher
            .dispatch(&InboundMessage::text(sender, content))
            .await
    }

    #[tokio::test]
    async fn claim_success_is_silent() {
        let (dispatcher, api) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert!(plan.is_empty());
        let transfers = api.transfers.lock().unwrap();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].asset_id, CLAIM_ASSET_ID);
        assert_eq!(
            transfers[0].trace_id,
            trace::claim_trace("user-1", Local::now().date_naive())
        );
    }

    #[tokio::test]
    async fn settled_claim_answers_already_claimed() {
        let api = MockApi {
            prior_transfer: Some(Transfer {
                snapshot_id: Some("b8e4d0c2".to_string()),
                trace_id: Uuid::nil(),
                asset_id: CLAIM_ASSET_ID,
                opponent_id: None,
                amount: CLAIM_AMOUNT,
                memo: String::new(),
            }),
            ..MockApi::default()
        };
        let (dispatcher, api) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert_eq!(plan, ResponsePlan::text(MSG_ALREADY_CLAIMED));
        assert!(api.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsettled_claim_stays_silent() {
        let api = MockApi {
            prior_transfer: Some(Transfer {
                snapshot_id: None,
                trace_id: Uuid::nil(),
                asset_id: CLAIM_ASSET_ID,
                opponent_id: None,
                amount: CLAIM_AMOUNT,
                memo: String::new(),
            }),
            ..MockApi::default()
        };
        let (dispatcher, api) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert!(plan.is_empty());
        assert!(api.transfers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_balance_renders_text_and_donate_button() {
        let api = MockApi {
            transfer_failure: Some(crate::api::ERR_INSUFFICIENT_BALANCE),
            ..MockApi::default()
        };
        let (dispatcher, _) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert_eq!(
            plan,
            ResponsePlan::text(MSG_INSUFFICIENT_BALANCE).with_button(
                BTN_DONATE,
                format!("mixin://transfer/{CLIENT_ID}"),
                COLOR_MINT
            )
        );
    }

    #[tokio::test]
    async fn duplicate_trace_reports_the_lost_race() {
        let api = MockApi {
            transfer_failure: Some(crate::api::ERR_DUPLICATE_TRACE),
            ..MockApi::default()
        };
        let (dispatcher, _) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert_eq!(plan, ResponsePlan::text(MSG_CLAIM_KEY_USED));
    }

    #[tokio::test]
    async fn unknown_transfer_failures_are_swallowed() {
        let api = MockApi {
            transfer_failure: Some(500),
            ..MockApi::default()
        };
        let (dispatcher, _) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "/claim").await;

        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn donate_renders_a_single_black_button() {
        let (dispatcher, _) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "/donate").await;

        assert_eq!(
            plan,
            ResponsePlan::new().with_button(
                BTN_DONATE,
                format!("mixin://transfer/{CLIENT_ID}"),
                COLOR_BLACK
            )
        );
    }

    #[tokio::test]
    async fn help_renders_text_and_both_action_buttons() {
        let (dispatcher, _) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "?").await;

        assert_eq!(
            plan,
            ResponsePlan::text(HELP_TEXT)
                .with_button(BTN_CHECK_IN, "input:/claim", COLOR_MINT)
                .with_button(BTN_DONATE, "input:/donate", COLOR_CORAL)
        );
    }

    #[tokio::test]
    async fn unauthorized_proposal_is_rejected_without_the_memo() {
        let (dispatcher, api) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "/proposal").await;

        assert_eq!(plan, ResponsePlan::text(MSG_PROPOSAL_DENIED));
        assert!(api.multisig_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn authorized_proposal_broadcasts_and_links_the_account() {
        let owner = DEFAULT_PROPOSAL_OWNER.to_string();
        let (dispatcher, api) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, &owner, "/proposal").await;

        let requests = api.multisig_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.asset_id, PROPOSAL_ASSET_ID);
        assert_eq!(request.threshold, PROPOSAL_THRESHOLD);
        assert_eq!(request.receivers, PROPOSAL_RECEIVERS.to_vec());

        // The memo decodes back into the proposal operation.
        let encoded = URL_SAFE_NO_PAD.decode(&request.memo).unwrap();
        let operation = Operation::decode(&encoded).unwrap();
        assert_eq!(operation.kind, crate::agent::proposal::KIND_ACCOUNT_PROPOSAL);
        assert_eq!(operation.curve, crate::agent::proposal::CURVE_ED25519);
        assert_eq!(operation.id, request.trace_id);
        assert_eq!(operation.extra[..2], [1, 1]);
        assert_eq!(&operation.extra[2..], DEFAULT_PROPOSAL_OWNER.as_bytes());

        assert_eq!(
            plan,
            ResponsePlan::text(format!("curl {ACCOUNT_URL_BASE}{}", request.trace_id))
        );
    }

    #[tokio::test]
    async fn unresolvable_identifier_is_not_recognized() {
        let (dispatcher, _) = dispatcher(MockApi::default());
        let plan = dispatch_text(
            &dispatcher,
            "user-1",
            "9c9f2f1e-7b57-4a14-9b39-f4d0a8a2f7de",
        )
        .await;

        assert_eq!(plan, ResponsePlan::text(MSG_NOT_RECOGNIZED));
    }

    #[tokio::test]
    async fn identifier_matching_an_asset_renders_its_record() {
        let asset_id = CLAIM_ASSET_ID;
        let (dispatcher, _) = dispatcher(MockApi::default().with_asset(sample_asset(asset_id)));
        let plan = dispatch_text(&dispatcher, "user-1", &asset_id.to_string()).await;

        assert_eq!(plan.len(), 1);
        match &plan.actions()[0] {
            OutboundAction::SendCodeBlock { json } => {
                assert!(json.contains("CNB"));
                assert!(json.contains(&asset_id.to_string()));
            }
            other => panic!("expected a code block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn identifier_matching_a_user_renders_the_full_card() {
        let user_id = "71b72e67-3636-473a-9ee4-db7ba3094057";
        let (dispatcher, _) =
            dispatcher(MockApi::default().with_user(user_id, sample_user(user_id)));
        let plan = dispatch_text(&dispatcher, "user-1", user_id).await;

        // Queried by the user's own id, so no id echo in between.
        let kinds: Vec<_> = plan.actions().iter().map(OutboundAction::kind).collect();
        assert_eq!(kinds, vec!["contact_card", "button", "image"]);

        match &plan.actions()[1] {
            OutboundAction::SendButton {
                label,
                action,
                color,
            } => {
                assert_eq!(label, "transfer to Calculator");
                assert_eq!(action, &format!("mixin://transfer/{user_id}"));
                assert_eq!(color, COLOR_MINT);
            }
            other => panic!("expected a button, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn identity_number_lookup_echoes_the_resolved_id() {
        let user_id = "71b72e67-3636-473a-9ee4-db7ba3094057";
        let (dispatcher, _) =
            dispatcher(MockApi::default().with_user("7000103394", sample_user(user_id)));
        let plan = dispatch_text(&dispatcher, "user-1", "7000103394").await;

        let kinds: Vec<_> = plan.actions().iter().map(OutboundAction::kind).collect();
        assert_eq!(kinds, vec!["contact_card", "text", "button", "image"]);
        assert_eq!(
            plan.actions()[1],
            OutboundAction::SendText {
                content: user_id.to_string()
            }
        );
    }

    #[tokio::test]
    async fn unknown_identity_number_is_not_recognized() {
        let (dispatcher, _) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "7000103394").await;

        assert_eq!(plan, ResponsePlan::text(MSG_NOT_RECOGNIZED));
    }

    #[tokio::test]
    async fn symbol_search_renders_first_match_and_full_listing() {
        let asset = sample_asset(CLAIM_ASSET_ID);
        let api = MockApi {
            search_results: vec![asset.clone()],
            ..MockApi::default()
        };
        let (dispatcher, _) = dispatcher(api);
        let plan = dispatch_text(&dispatcher, "user-1", "cnb").await;

        assert_eq!(plan.len(), 2);
        assert_eq!(
            plan.actions()[0],
            OutboundAction::SendText {
                content: asset.asset_id.to_string()
            }
        );
        assert!(matches!(
            &plan.actions()[1],
            OutboundAction::SendCodeBlock { .. }
        ));
    }

    #[tokio::test]
    async fn fruitless_symbol_search_is_not_recognized() {
        let (dispatcher, _) = dispatcher(MockApi::default());
        let plan = dispatch_text(&dispatcher, "user-1", "xyz").await;

        assert_eq!(plan, ResponsePlan::text(MSG_NOT_RECOGNIZED));
    }

    #[tokio::test]
    async fn deposits_are_acknowledged_with_the_asset_symbol() {
        let (dispatcher, _) = dispatcher(MockApi::default().with_asset(sample_asset(CLAIM_ASSET_ID)));
        let payload = format!(
            r#"{{"snapshot_id": "s-1", "asset_id": "{CLAIM_ASSET_ID}", "amount": "0.42"}}"#
        );
        let message = InboundMessage::new(
            "user-1",
            crate::agent::router::MessageCategory::SystemSnapshot,
            payload.into_bytes(),
        );
        let plan = dispatcher.dispatch(&message).await;

        assert_eq!(
            plan,
            ResponsePlan::text("received your donation of 0.42 CNB, thank you for the support")
        );
    }
}
