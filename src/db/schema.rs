use sqlx::PgPool;

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS users (
  id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
  login TEXT NOT NULL,
  password_hash TEXT NOT NULL,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  CONSTRAINT users_login_unique UNIQUE (login)
);
"#,
    )
    .execute(pool)
    .await?;

    // The two named constraints below are the ones AppError::AlreadyExists /
    // AppError::Conflict disambiguate on: a duplicate primary key means this
    // user already uploaded the order, a duplicate order_number means someone
    // else did.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS loyalty_points_accrual (
  order_number TEXT NOT NULL,
  user_id UUID NOT NULL REFERENCES users(id),
  status TEXT NOT NULL,
  accrual NUMERIC,
  uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  processed_at TIMESTAMPTZ,
  processing_lock BOOLEAN NOT NULL DEFAULT false,
  CONSTRAINT pk_loyalty_points_accrual PRIMARY KEY (order_number, user_id),
  CONSTRAINT loyalty_points_accrual_order_number_unique UNIQUE (order_number)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS loyalty_points_withdrawn (
  id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
  order_number TEXT NOT NULL,
  user_id UUID NOT NULL REFERENCES users(id),
  sum NUMERIC NOT NULL,
  processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_accrual_user ON loyalty_points_accrual(user_id);"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_accrual_claimable
           ON loyalty_points_accrual(uploaded_at)
           WHERE status IN ('NEW', 'PROCESSING') AND processing_lock = false;"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_withdrawn_user ON loyalty_points_withdrawn(user_id);"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
