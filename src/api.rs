//! REST client for the game server plus the request/response bodies it speaks.

use crate::error::{ClientError, Result};
use crate::input::Direction;
use crate::state::{EntityId, GameState, ItemProperties};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

// --- Requests ---------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MoveRequest {
    direction: Direction,
}

#[derive(Debug, Serialize)]
struct CombatActionRequest<'a> {
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_id: Option<&'a EntityId>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    npc_index: &'a EntityId,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ItemRequest<'a> {
    item_id: &'a EntityId,
}

#[derive(Debug, Serialize)]
struct LootTakeRequest<'a> {
    corpse_id: &'a EntityId,
    loot_id: &'a EntityId,
}

#[derive(Debug, Serialize)]
struct CraftRequest<'a> {
    recipe_id: &'a str,
}

/// Body of `/api/interact_specific`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractTarget {
    pub action: &'static str,
    pub target_type: &'static str,
    pub target_id: EntityId,
}

impl InteractTarget {
    pub fn inspect_secret(id: EntityId) -> Self {
        Self {
            action: "inspect",
            target_type: "secret",
            target_id: id,
        }
    }

    pub fn loot_corpse(id: EntityId) -> Self {
        Self {
            action: "loot",
            target_type: "corpse",
            target_id: id,
        }
    }
}

// --- Responses --------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NarrativeResponse {
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MessageResponse {
    /// The message, or the error when the server only sent that.
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    Text {
        #[serde(default)]
        message: String,
    },
    Anim {
        #[serde(default)]
        actor: String,
    },
    #[serde(alias = "turn_switch")]
    SwitchTurn {
        actor: Option<String>,
        title: Option<String>,
        content: Option<String>,
    },
    Popup {
        title: Option<String>,
        content: Option<String>,
        color: Option<String>,
        duration: Option<u32>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CombatResult {
    Events { events: Vec<CombatEvent> },
    Text(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombatResponse {
    pub result: Option<CombatResult>,
    pub narrative: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatResponse {
    pub npc_name: Option<String>,
    pub reply: Option<String>,
    #[serde(default)]
    pub can_trade: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShopItem {
    #[serde(default)]
    pub name: String,
    pub value: Option<u32>,
    pub description: Option<String>,
    #[serde(default)]
    pub properties: ItemProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopCatalog {
    #[serde(default)]
    pub shops: BTreeMap<String, Vec<EntityId>>,
    #[serde(default)]
    pub items: BTreeMap<String, ShopItem>,
}

/// One purchasable entry; `id` is the template id the buy endpoint expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopListing {
    pub id: EntityId,
    pub item: ShopItem,
}

impl ShopCatalog {
    /// Stock for `merchant`, or every shop's stock when the merchant is not
    /// named or not known. Ids without a template are skipped.
    pub fn stock(&self, merchant: Option<&str>) -> Vec<ShopListing> {
        let ids: Vec<&EntityId> = match merchant.and_then(|m| self.shops.get(m)) {
            Some(ids) => ids.iter().collect(),
            None => {
                let mut all: Vec<&EntityId> = Vec::new();
                for id in self.shops.values().flatten() {
                    if !all.contains(&id) {
                        all.push(id);
                    }
                }
                all
            }
        };
        ids.into_iter()
            .filter_map(|id| {
                self.items.get(id.as_str()).map(|item| ShopListing {
                    id: id.clone(),
                    item: item.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum LootTag {
    #[serde(rename = "loot_window")]
    LootWindow,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootItem {
    #[serde(default)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    pub icon: Option<String>,
}

impl LootItem {
    /// Key sent to `/api/loot/take`; the server matches it against id or name.
    pub fn take_key(&self) -> EntityId {
        self.id.clone().unwrap_or_else(|| EntityId::from(self.name.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootWindow {
    #[allow(dead_code)]
    #[serde(rename = "type")]
    tag: LootTag,
    #[serde(default)]
    pub name: String,
    pub corpse_id: EntityId,
    #[serde(default)]
    pub loot: Vec<LootItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Narrative {
    Loot(LootWindow),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractResponse {
    pub narrative: Option<Narrative>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ingredients: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpottedEntity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dist: f64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestigateResponse {
    pub narrative: Option<String>,
    #[serde(default)]
    pub entities: Vec<SpottedEntity>,
}

// --- Client -----------------------------------------------------------------

/// Thin JSON-over-fetch client. Cheap to clone into async tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn send(&self, method: &str, path: &str, body: Option<String>) -> Result<String> {
        let window = web_sys::window().ok_or(ClientError::NoWindow)?;
        let url = self.url(path);
        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = body.as_deref() {
            init.set_body(&wasm_bindgen::JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(&url, &init)?;
        if body.is_some() {
            request.headers().set("Content-Type", "application/json")?;
        }
        let resp: Response = JsFuture::from(window.fetch_with_request(&request))
            .await?
            .dyn_into()?;
        if !resp.ok() {
            return Err(ClientError::Http {
                status: resp.status(),
                url,
            });
        }
        let text = JsFuture::from(resp.text()?).await?;
        Ok(text.as_string().unwrap_or_default())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let text = self.send("GET", path, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_string(body)?;
        let text = self.send("POST", path, Some(body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// POST without a body. An empty reply decodes as `T::default()`.
    pub async fn post_empty<T: DeserializeOwned + Default>(&self, path: &str) -> Result<T> {
        let text = self.send("POST", path, None).await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn fetch_state(&self) -> Result<GameState> {
        let path = format!("/api/state?t={}", js_sys::Date::now() as u64);
        self.get_json(&path).await
    }

    pub async fn move_player(&self, direction: Direction) -> Result<NarrativeResponse> {
        self.post_json("/api/move", &MoveRequest { direction }).await
    }

    pub async fn combat_action(
        &self,
        action: &str,
        target_id: Option<&EntityId>,
    ) -> Result<CombatResponse> {
        self.post_json("/api/combat/action", &CombatActionRequest { action, target_id })
            .await
    }

    pub async fn chat(&self, npc: &EntityId, message: &str) -> Result<ChatResponse> {
        self.post_json(
            "/api/chat",
            &ChatRequest {
                npc_index: npc,
                message,
            },
        )
        .await
    }

    pub async fn shop_list(&self) -> Result<ShopCatalog> {
        self.get_json("/api/shop/list").await
    }

    pub async fn shop_buy(&self, item_id: &EntityId) -> Result<MessageResponse> {
        self.post_json("/api/shop/buy", &ItemRequest { item_id }).await
    }

    pub async fn shop_sell(&self, item_id: &EntityId) -> Result<MessageResponse> {
        self.post_json("/api/shop/sell", &ItemRequest { item_id }).await
    }

    pub async fn interact(&self) -> Result<NarrativeResponse> {
        self.post_empty("/api/interact").await
    }

    pub async fn interact_specific(&self, target: &InteractTarget) -> Result<InteractResponse> {
        self.post_json("/api/interact_specific", target).await
    }

    pub async fn equip(&self, item_id: &EntityId) -> Result<MessageResponse> {
        self.post_json("/api/inventory/equip", &ItemRequest { item_id }).await
    }

    pub async fn unequip(&self, item_id: &EntityId) -> Result<MessageResponse> {
        self.post_json("/api/inventory/unequip", &ItemRequest { item_id }).await
    }

    pub async fn use_item(&self, item_id: &EntityId) -> Result<MessageResponse> {
        self.post_json("/api/inventory/use", &ItemRequest { item_id }).await
    }

    pub async fn take_loot(
        &self,
        corpse_id: &EntityId,
        loot_id: &EntityId,
    ) -> Result<MessageResponse> {
        self.post_json("/api/loot/take", &LootTakeRequest { corpse_id, loot_id })
            .await
    }

    pub async fn craft_list(&self) -> Result<BTreeMap<String, Recipe>> {
        self.get_json("/api/craft/list").await
    }

    pub async fn craft(&self, recipe_id: &str) -> Result<MessageResponse> {
        self.post_json("/api/craft/make", &CraftRequest { recipe_id }).await
    }

    pub async fn investigate(&self) -> Result<InvestigateResponse> {
        self.post_empty("/api/action/investigate").await
    }

    pub async fn reset(&self) -> Result<MessageResponse> {
        self.post_empty("/api/debug/reset").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_bodies_match_server_contract() {
        let body = serde_json::to_string(&MoveRequest {
            direction: Direction::North,
        })
        .unwrap();
        assert_eq!(body, r#"{"direction":"north"}"#);

        let flee = serde_json::to_string(&CombatActionRequest {
            action: "flee",
            target_id: None,
        })
        .unwrap();
        assert_eq!(flee, r#"{"action":"flee"}"#);

        let target = EntityId::from("12");
        let attack = serde_json::to_string(&CombatActionRequest {
            action: "attack",
            target_id: Some(&target),
        })
        .unwrap();
        assert_eq!(attack, r#"{"action":"attack","target_id":"12"}"#);

        let inspect =
            serde_json::to_string(&InteractTarget::inspect_secret("door_1".into())).unwrap();
        assert_eq!(
            inspect,
            r#"{"action":"inspect","target_type":"secret","target_id":"door_1"}"#
        );
    }

    #[test]
    fn combat_events_accept_both_turn_spellings_and_unknowns() {
        let resp: CombatResponse = serde_json::from_str(
            r#"{"result":{"events":[
                {"type":"text","message":"You swing."},
                {"type":"anim","actor":"player"},
                {"type":"turn_switch","actor":"enemy"},
                {"type":"switch_turn","actor":"player","title":"Go"},
                {"type":"popup","title":"HIT!","content":"5 dmg"},
                {"type":"confetti"}
            ]}}"#,
        )
        .unwrap();
        let Some(CombatResult::Events { events }) = resp.result else {
            panic!("expected events");
        };
        assert_eq!(events.len(), 6);
        assert!(matches!(&events[2], CombatEvent::SwitchTurn { actor: Some(a), .. } if a == "enemy"));
        assert!(matches!(&events[3], CombatEvent::SwitchTurn { title: Some(t), .. } if t == "Go"));
        assert_eq!(events[5], CombatEvent::Unknown);
    }

    #[test]
    fn combat_result_may_be_plain_text() {
        let resp: CombatResponse =
            serde_json::from_str(r#"{"result":"Not in combat."}"#).unwrap();
        assert_eq!(resp.result, Some(CombatResult::Text("Not in combat.".into())));
    }

    #[test]
    fn interact_narrative_distinguishes_loot_windows() {
        let loot: InteractResponse = serde_json::from_str(
            r#"{"narrative":{"type":"loot_window","name":"Goblin","corpse_id":4,
                "loot":[{"id":9,"name":"Dagger","icon":"🗡️"}]}}"#,
        )
        .unwrap();
        let Some(Narrative::Loot(window)) = loot.narrative else {
            panic!("expected loot window");
        };
        assert_eq!(window.corpse_id.as_str(), "4");
        assert_eq!(window.loot[0].name, "Dagger");

        let text: InteractResponse =
            serde_json::from_str(r#"{"narrative":"The corpse is empty."}"#).unwrap();
        assert!(matches!(text.narrative, Some(Narrative::Text(_))));

        let other: InteractResponse =
            serde_json::from_str(r#"{"narrative":{"type":"something_else"}}"#).unwrap();
        assert!(matches!(other.narrative, Some(Narrative::Other(_))));
    }

    fn catalog() -> ShopCatalog {
        serde_json::from_str(
            r#"{"shops":{"Gareth":["sword","shield"],"Elara":["potion","sword"]},
                "items":{"sword":{"name":"Sword","value":20},
                         "shield":{"name":"Shield","value":15},
                         "potion":{"name":"Potion","value":5}}}"#,
        )
        .unwrap()
    }

    #[test]
    fn stock_for_named_merchant() {
        let stock = catalog().stock(Some("Gareth"));
        let names: Vec<_> = stock.iter().map(|l| l.item.name.as_str()).collect();
        assert_eq!(names, ["Sword", "Shield"]);
        assert_eq!(stock[0].id.as_str(), "sword");
    }

    #[test]
    fn unknown_or_missing_merchant_lists_everything_once() {
        let cat = catalog();
        assert_eq!(cat.stock(None).len(), 3);
        assert_eq!(cat.stock(Some("Nobody")).len(), 3);
    }

    #[test]
    fn message_response_falls_back_to_error() {
        let r: MessageResponse = serde_json::from_str(r#"{"error":"No such item"}"#).unwrap();
        assert_eq!(r.text(), Some("No such item"));
    }
}
