//! # Pool de Workers con Cola Acotada
//! src/server/pool.rs
//!
//! Un número fijo de threads consume tareas de una cola FIFO thread-safe
//! con capacidad máxima. Cuando la cola está llena, quien encola decide:
//! rechazar (`try_submit`) o esperar (`submit`).
//!
//! Al cerrarse (`close` o `Drop`) los items pendientes se descartan y no se
//! espera a las tareas en curso. `join` es el cierre ordenado: vacía la
//! cola y espera a los workers.
//!
//! ```text
//! accept loop ──submit──▶ [ cola (capacidad N) ] ──▶ worker-0 .. worker-k
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Estado protegido por el mutex de la cola
struct QueueState<T> {
    items: VecDeque<T>,

    /// Ya no se aceptan items; los workers terminan al vaciar la cola
    closed: bool,
}

/// Parte compartida entre el pool y sus workers
struct Shared<T> {
    state: Mutex<QueueState<T>>,

    /// Notifica a los workers que hay trabajo
    available: Condvar,

    /// Notifica a `submit` que se liberó lugar
    space: Condvar,

    capacity: usize,
}

/// Pool de tamaño fijo que ejecuta `task` sobre cada item encolado
pub struct WorkerPool<T> {
    shared: Arc<Shared<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Crea el pool e inicia `size` workers
    ///
    /// Falla solo si el sistema no permite crear los threads.
    pub fn new<F>(size: usize, capacity: usize, task: F) -> io::Result<Self>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Condvar::new(),
            space: Condvar::new(),
            capacity,
        });
        let task = Arc::new(task);

        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size),
        };

        for i in 0..size {
            let shared = Arc::clone(&pool.shared);
            let task = Arc::clone(&task);
            let name = format!("worker-{}", i);

            // Si falla a mitad de camino, el Drop del pool detiene los ya creados
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || Self::worker_loop(&name, &shared, task.as_ref()))?;
            pool.workers.push(handle);
        }

        Ok(pool)
    }

    /// Intenta encolar sin bloquear
    ///
    /// Retorna el item de vuelta si la cola está llena o cerrada.
    pub fn try_submit(&self, item: T) -> Result<(), T> {
        let mut state = self.shared.state.lock();

        if state.closed || state.items.len() >= self.shared.capacity {
            return Err(item);
        }

        state.items.push_back(item);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Encola bloqueando mientras la cola esté llena
    ///
    /// Retorna el item de vuelta si la cola se cierra mientras espera.
    pub fn submit(&self, item: T) -> Result<(), T> {
        let mut state = self.shared.state.lock();

        while !state.closed && state.items.len() >= self.shared.capacity {
            self.shared.space.wait(&mut state);
        }

        if state.closed {
            return Err(item);
        }

        state.items.push_back(item);
        self.shared.available.notify_one();
        Ok(())
    }

    /// Cierre ordenado: los workers vacían la cola y se los espera
    pub fn join(mut self) {
        self.shared.state.lock().closed = true;
        self.shared.available.notify_all();
        self.shared.space.notify_all();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                error!("worker thread terminated abnormally");
            }
        }
    }

    /// Cantidad de items esperando un worker
    pub fn queued(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Loop principal del worker
    ///
    /// Un panic de la tarea se registra y el worker sigue vivo: el pool
    /// mantiene siempre su tamaño.
    fn worker_loop<F>(name: &str, shared: &Shared<T>, task: &F)
    where
        F: Fn(T),
    {
        debug!(worker = name, "worker started");

        loop {
            let item = {
                let mut state = shared.state.lock();
                loop {
                    if let Some(item) = state.items.pop_front() {
                        break item;
                    }
                    if state.closed {
                        debug!(worker = name, "worker stopped");
                        return;
                    }
                    shared.available.wait(&mut state);
                }
            };
            shared.space.notify_one();

            if panic::catch_unwind(AssertUnwindSafe(|| task(item))).is_err() {
                error!(worker = name, "task panicked, connection abandoned");
            }
        }
    }
}

impl<T> WorkerPool<T> {
    /// Cierra la cola y descarta los items que no empezaron
    ///
    /// No espera a las tareas en curso. Retorna cuántos items se
    /// descartaron.
    pub fn close(&self) -> usize {
        let discarded: Vec<T> = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.items.drain(..).collect()
        };
        self.shared.available.notify_all();
        self.shared.space.notify_all();

        // Se destruyen fuera del lock
        discarded.len()
    }
}

impl<T> Drop for WorkerPool<T> {
    /// Descarta lo pendiente y suelta los workers sin esperarlos
    ///
    /// Un worker ocupado termina su tarea actual y sale.
    fn drop(&mut self) {
        let discarded = self.close();
        if discarded > 0 {
            debug!(discarded, "worker pool dropped with queued items");
        }
        self.workers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    /// Pool de 1 worker cuya tarea avisa al empezar y espera una señal
    fn gated_pool() -> (WorkerPool<u32>, mpsc::Receiver<u32>, mpsc::Sender<()>, mpsc::Receiver<u32>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel();
        let started_tx = std::sync::Mutex::new(started_tx);
        let gate_rx = std::sync::Mutex::new(gate_rx);
        let done_tx = std::sync::Mutex::new(done_tx);

        let pool = WorkerPool::new(1, 1, move |n: u32| {
            started_tx.lock().unwrap().send(n).unwrap();
            gate_rx.lock().unwrap().recv().unwrap();
            done_tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        (pool, started_rx, gate_tx, done_rx)
    }

    #[test]
    fn test_runs_every_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);

        let pool = WorkerPool::new(4, 100, move |n: usize| {
            seen.fetch_add(n, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.capacity(), 100);

        for n in 1..=10 {
            pool.submit(n).unwrap();
        }
        pool.join(); // drena la cola y espera a los workers

        assert_eq!(counter.load(Ordering::SeqCst), 55);
    }

    #[test]
    fn test_try_submit_rejects_when_full() {
        let (pool, started, gate, done) = gated_pool();

        pool.try_submit(1).unwrap();
        assert_eq!(started.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        // El worker está ocupado: cabe uno en la cola y el siguiente se rechaza
        assert!(pool.try_submit(2).is_ok());
        assert_eq!(pool.try_submit(3), Err(3));
        assert_eq!(pool.queued(), 1);

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        assert_eq!(done.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert_eq!(done.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    }

    #[test]
    fn test_submit_blocks_until_space() {
        let (pool, started, gate, done) = gated_pool();
        let pool = Arc::new(pool);

        pool.submit(1).unwrap();
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.submit(2).unwrap();

        let (submitted_tx, submitted_rx) = mpsc::channel();
        let blocked = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                pool.submit(3).unwrap();
                submitted_tx.send(()).unwrap();
            })
        };

        // Sigue bloqueado mientras la cola esté llena
        assert!(submitted_rx.recv_timeout(Duration::from_millis(100)).is_err());

        gate.send(()).unwrap();
        submitted_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        blocked.join().unwrap();

        gate.send(()).unwrap();
        gate.send(()).unwrap();
        let finished: Vec<u32> = (0..3)
            .map(|_| done.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(finished, vec![1, 2, 3]);
    }

    #[test]
    fn test_panic_does_not_kill_worker() {
        let (done_tx, done_rx) = mpsc::channel();
        let done_tx = std::sync::Mutex::new(done_tx);

        let pool = WorkerPool::new(1, 10, move |n: u32| {
            if n == 0 {
                panic!("boom");
            }
            done_tx.lock().unwrap().send(n).unwrap();
        })
        .unwrap();

        pool.submit(0).unwrap();
        pool.submit(7).unwrap();

        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_drop_does_not_wait_for_running_task() {
        let (started, started_rx) = mpsc::channel();
        let (gate, gate_rx) = mpsc::channel::<()>();
        let started = std::sync::Mutex::new(started);
        let gate_rx = std::sync::Mutex::new(gate_rx);

        let pool = WorkerPool::new(1, 4, move |item: Arc<u32>| {
            started.lock().unwrap().send(*item).unwrap();
            let _ = gate_rx.lock().unwrap().recv();
        })
        .unwrap();

        let running = Arc::new(1);
        let queued = Arc::new(2);
        pool.submit(Arc::clone(&running)).unwrap();
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        pool.submit(Arc::clone(&queued)).unwrap();

        // La tarea en curso sigue bloqueada; el drop igual debe volver
        let (dropped_tx, dropped_rx) = mpsc::channel();
        thread::spawn(move || {
            drop(pool);
            dropped_tx.send(()).unwrap();
        });
        dropped_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        // El item pendiente se destruyó sin ejecutarse
        assert_eq!(Arc::strong_count(&queued), 1);
        assert!(started_rx.recv_timeout(Duration::from_millis(100)).is_err());

        gate.send(()).unwrap();
    }

    #[test]
    fn test_close_discards_and_rejects() {
        let (pool, started, gate, done) = gated_pool();

        pool.submit(1).unwrap();
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.submit(2).unwrap();

        assert_eq!(pool.close(), 1);
        assert_eq!(pool.queued(), 0);
        assert_eq!(pool.try_submit(3), Err(3));
        assert_eq!(pool.submit(4), Err(4));

        gate.send(()).unwrap();
        assert_eq!(done.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert!(done.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_close_wakes_blocked_submit() {
        let (pool, started, gate, _done) = gated_pool();
        let pool = Arc::new(pool);

        pool.submit(1).unwrap();
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        pool.submit(2).unwrap();

        let blocked = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.submit(3))
        };
        thread::sleep(Duration::from_millis(50));

        pool.close();
        assert_eq!(blocked.join().unwrap(), Err(3));

        gate.send(()).unwrap();
    }
}
