use std::collections::VecDeque;
use std::mem::drop;
use std::ops::{Deref, DerefMut, Drop};
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::{Arc, Weak};

use futures::channel::oneshot;
use once_cell::sync::OnceCell;
use tokio::sync::{Mutex, MutexGuard};

use crate::database::Client;

pub struct Connect {
    connect: Option<Client>,
    pool: Weak<SharedPool>,
}

impl Connect {
    pub async fn release(mut self) {
        let pool = self.pool.upgrade();
        if let Some(pool) = pool {
            let mut pool = pool.inner.lock().await;
            pool.put_back(self.connect.take().unwrap());
        }
    }
}

impl Deref for Connect {
    type Target = Client;

    fn deref(&self) -> &Client {
        self.connect.as_ref().unwrap()
    }
}

impl DerefMut for Connect {
    fn deref_mut(&mut self) -> &mut Client {
        self.connect.as_mut().unwrap()
    }
}

impl Drop for Connect {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.unreleased.fetch_add(1, Ordering::Relaxed);
        }
    }
}

struct InternalPool {
    waiters: VecDeque<oneshot::Sender<Client>>,
    conns: VecDeque<Client>,
    num: usize,
}

impl InternalPool {
    fn put_back(&mut self, mut connect: Client) {
        if connect.is_broken() {
            return;
        }
        while let Some(waiter) = self.waiters.pop_front() {
            if let Err(returned) = waiter.send(connect) {
                connect = returned;
            } else {
                return;
            }
        }
        self.conns.push_back(connect);
    }
}

struct SharedPool {
    config: tokio_postgres::Config,
    inner: Mutex<InternalPool>,
    unreleased: AtomicIsize,
}

#[derive(Clone)]
pub struct Pool {
    inner: Arc<SharedPool>,
}

impl Pool {
    pub async fn with_num(num: usize) -> Pool {
        let config: tokio_postgres::Config = crate::database::get_postgres_url()
            .parse()
            .expect("Failed to parse Postgres connect URL");

        let mut conns: VecDeque<Client> = VecDeque::with_capacity(num);
        for _ in 0..num {
            let client = Client::with_config(&config)
                .await
                .expect("Failed to connect to the database");
            conns.push_back(client);
        }
        let waiters = VecDeque::new();
        let internal_pool = InternalPool { waiters, conns, num };
        let shared_pool = SharedPool {
            inner: Mutex::new(internal_pool),
            config,
            unreleased: AtomicIsize::new(0),
        };
        Pool {
            inner: Arc::new(shared_pool),
        }
    }

    pub async fn get(&self) -> Connect {
        let mut internal: MutexGuard<InternalPool> = self.inner.inner.lock().await;
        let pool = Arc::downgrade(&self.inner);
        if let Some(client) = internal.conns.pop_front() {
            Connect {
                connect: Some(client),
                pool,
            }
        } else if self.inner.unreleased.fetch_sub(1, Ordering::Relaxed) <= 0 {
            self.inner.unreleased.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = oneshot::channel::<Client>();
            internal.waiters.push_back(tx);
            drop(internal);
            Connect {
                connect: Some(rx.await.unwrap()),
                pool,
            }
        } else {
            let new = Client::with_config(&self.inner.config)
                .await
                .expect("Failed to connect to the database");
            Connect {
                connect: Some(new),
                pool,
            }
        }
    }
}

static POOL: OnceCell<Pool> = OnceCell::new();

pub async fn init() {
    let pool = Pool::with_num(8).await;
    if POOL.set(pool).is_err() {
        log::warn!("the database pool was initialized twice");
    }
}

/// Get a database connection from the pool.
pub async fn get() -> Connect {
    POOL.get().expect("the database pool is not initialized").get().await
}
