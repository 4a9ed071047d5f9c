#[macro_export]
macro_rules! db {
    ($ctx: expr) => {
        {
            let ctx_global = $ctx.data.read().await;
            let out = ctx_global.get::<Database>().expect("Couldn't find database").clone();

            out
        }
    }
}

#[macro_export]
macro_rules! horadricdb {
    ($ctx: expr) => {
        {
            db!($ctx.serenity_context())
        }
    }
}

#[macro_export]
macro_rules! config {
    ($ctx: expr) => {
        {
            let ctx_global = $ctx.data.read().await;
            let out = ctx_global.get::<$crate::models::config::Config>().expect("Couldn't find config").clone();

            out
        }
    }
}
