/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `PLANGATE_DUCKDB_MEMORY`, default `"1GB"`).
///
/// Plan `limits` and `features` are JSON text. Limit values are read leniently
/// by the core (see `PlanLimits::merged`), so the column is not typed further.
///
/// The four resource tables share one shape; only `tenant_id` is consulted by
/// the usage counter.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- PLANS (written by billing administration)
-- ===========================================
CREATE TABLE IF NOT EXISTS plans (
    id              VARCHAR PRIMARY KEY,
    slug            VARCHAR NOT NULL UNIQUE,       -- 'free' | 'pro' | 'premium' | ...
    name            VARCHAR NOT NULL,
    limits          VARCHAR NOT NULL DEFAULT '{{}}', -- JSON object, -1 = unlimited
    features        VARCHAR NOT NULL DEFAULT '[]', -- JSON array of strings
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- SUBSCRIPTIONS (one per tenant, written by billing webhooks)
-- ===========================================
CREATE TABLE IF NOT EXISTS subscriptions (
    id                  VARCHAR PRIMARY KEY,
    tenant_id           VARCHAR NOT NULL UNIQUE,
    plan_id             VARCHAR NOT NULL,
    status              VARCHAR NOT NULL,          -- Stripe subscription status
    current_period_end  TIMESTAMP,
    created_at          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- RESOURCES (counted against plan limits)
-- ===========================================
CREATE TABLE IF NOT EXISTS expenses (
    id              VARCHAR PRIMARY KEY,
    tenant_id       VARCHAR NOT NULL,
    name            VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_expenses_tenant ON expenses(tenant_id);

CREATE TABLE IF NOT EXISTS cards (
    id              VARCHAR PRIMARY KEY,
    tenant_id       VARCHAR NOT NULL,
    name            VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_cards_tenant ON cards(tenant_id);

CREATE TABLE IF NOT EXISTS categories (
    id              VARCHAR PRIMARY KEY,
    tenant_id       VARCHAR NOT NULL,
    name            VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_categories_tenant ON categories(tenant_id);

CREATE TABLE IF NOT EXISTS loans (
    id              VARCHAR PRIMARY KEY,
    tenant_id       VARCHAR NOT NULL,
    name            VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_loans_tenant ON loans(tenant_id);

-- ===========================================
-- USAGE HISTORY (append-only)
-- ===========================================
CREATE TABLE IF NOT EXISTS usage_history (
    id              VARCHAR PRIMARY KEY,
    subscription_id VARCHAR NOT NULL,
    resource_kind   VARCHAR NOT NULL,
    used            BIGINT NOT NULL,               -- count after the creation
    limit_value     BIGINT NOT NULL,               -- -1 = unlimited
    created_at      TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_usage_history_subscription
    ON usage_history(subscription_id, created_at);

CREATE TABLE IF NOT EXISTS usage_snapshots (
    id              VARCHAR PRIMARY KEY,
    tenant_id       VARCHAR NOT NULL,
    plan_slug       VARCHAR NOT NULL,
    resource_kind   VARCHAR NOT NULL,
    used            BIGINT NOT NULL,
    limit_value     BIGINT NOT NULL,
    created_at      TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_usage_snapshots_tenant
    ON usage_snapshots(tenant_id, created_at);
"#
    )
}
