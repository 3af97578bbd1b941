/// Schema for the eight control-plane tables, plus the enum types
/// backing the `sqlx::Type` model derives. Idempotent: every
/// statement is guarded so re-running the migrator is a no-op.
pub const MIGRATIONS: &[&str] = &[
    r#"
    DO $$ BEGIN
        CREATE TYPE token_type AS ENUM ('network', 'dual_vault');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE transaction_status AS ENUM ('pending', 'success', 'failed', 'refunded');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE transaction_type AS ENUM ('charge', 'refund');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE subscription_status AS ENUM ('active', 'past_due', 'canceled', 'trialing', 'paused');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE billing_cycle AS ENUM ('monthly', 'yearly');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE job_type AS ENUM ('billing', 'retry');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE job_status AS ENUM ('pending', 'running', 'completed', 'failed');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE retry_status AS ENUM ('pending', 'processing', 'succeeded', 'failed', 'canceled', 'exhausted');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    DO $$ BEGIN
        CREATE TYPE decline_type AS ENUM ('soft', 'hard');
    EXCEPTION WHEN duplicate_object THEN NULL; END $$;
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payment_methods (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        token_type token_type NOT NULL,
        network_token TEXT,
        processor_a_token TEXT,
        processor_b_token TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS plans (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        currency TEXT NOT NULL,
        billing_cycle billing_cycle NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subscriptions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        plan_id UUID NOT NULL REFERENCES plans(id),
        payment_method_id UUID NOT NULL REFERENCES payment_methods(id),
        status subscription_status NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        currency TEXT NOT NULL,
        billing_cycle billing_cycle NOT NULL,
        current_period_start TIMESTAMPTZ NOT NULL,
        current_period_end TIMESTAMPTZ NOT NULL,
        next_billing_date TIMESTAMPTZ NOT NULL,
        cancel_at_period_end BOOLEAN NOT NULL DEFAULT false,
        canceled_at TIMESTAMPTZ,
        trial_start TIMESTAMPTZ,
        trial_end TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (current_period_end > current_period_start)
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_subscriptions_due
        ON subscriptions (next_billing_date)
        WHERE status = 'active' AND cancel_at_period_end = false;
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id UUID PRIMARY KEY,
        subscription_id UUID REFERENCES subscriptions(id),
        payment_method_id UUID NOT NULL REFERENCES payment_methods(id),
        processor_used TEXT NOT NULL,
        amount NUMERIC(12, 2) NOT NULL,
        currency TEXT NOT NULL,
        status transaction_status NOT NULL,
        transaction_type transaction_type NOT NULL,
        idempotency_key TEXT NOT NULL,
        processor_transaction_id TEXT,
        original_transaction_id UUID REFERENCES transactions(id),
        error_code TEXT,
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT transactions_idempotency_key_unique UNIQUE (idempotency_key)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS routing_rules (
        name TEXT PRIMARY KEY,
        priority INT NOT NULL,
        condition_type TEXT NOT NULL,
        condition_value JSONB NOT NULL,
        target_processor TEXT NOT NULL,
        percentage INT,
        is_active BOOLEAN NOT NULL DEFAULT true
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS processor_health (
        processor_name TEXT PRIMARY KEY,
        healthy BOOLEAN NOT NULL DEFAULT true,
        last_probe_at TIMESTAMPTZ
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS scheduler_jobs (
        id UUID PRIMARY KEY,
        subscription_id UUID NOT NULL REFERENCES subscriptions(id),
        job_type job_type NOT NULL,
        status job_status NOT NULL,
        attempt INT NOT NULL DEFAULT 1,
        scheduled_at TIMESTAMPTZ NOT NULL,
        started_at TIMESTAMPTZ,
        completed_at TIMESTAMPTZ,
        transaction_id UUID REFERENCES transactions(id),
        processor_used TEXT,
        error_code TEXT,
        error_message TEXT
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS retry_queue (
        id UUID PRIMARY KEY,
        subscription_id UUID NOT NULL REFERENCES subscriptions(id),
        attempt INT NOT NULL DEFAULT 0,
        max_attempts INT NOT NULL DEFAULT 3,
        status retry_status NOT NULL,
        last_error_code TEXT,
        last_error_message TEXT,
        decline_type decline_type,
        next_retry_at TIMESTAMPTZ NOT NULL,
        last_attempt_at TIMESTAMPTZ,
        transaction_id UUID REFERENCES transactions(id),
        processor_used TEXT,
        resolved_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_retry_queue_one_active_per_subscription
        ON retry_queue (subscription_id)
        WHERE status = 'pending';
    "#,
];
